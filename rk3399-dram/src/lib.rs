//! # RK3399 DRAM frequency scaling and low-power engine
//!
//! This crate implements the secure-world side of DRAM dynamic frequency
//! switching (DFS) on the RK3399: deriving the full JEDEC timing parameter
//! set for a target frequency, programming it into the inactive
//! frequency-set slot of the controller / PHY-interface / PHY banks while
//! the active slot keeps serving traffic, handing the atomic PLL switch to
//! the M0 low-power microcontroller, and managing the self-refresh /
//! power-down / standby states across suspend and resume.
//!
//! All engine state lives in the [dfs::DramDfs] context object; nothing is
//! kept in globals. Hardware is reached through [regs::RegisterBank]
//! wrappers, which tests construct over plain buffers.
#![no_std]

pub mod dfs;
pub mod low_power;
pub mod mcu;
pub mod odt;
pub mod prog;
pub mod regs;
pub mod smc;
pub mod time;
pub mod timing;
pub mod wait;

pub use rk3399 as pac;

/// DRAM device type populated on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DramType {
    Ddr3,
    Lpddr3,
    Lpddr4,
}

/// Per-channel die geometry, captured from controller readback at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelInfo {
    /// Number of ranks (chip selects) populated.
    pub rank_count: u32,
    /// Column address bits.
    pub col_bits: u32,
    /// Bank address bits.
    pub bank_bits: u32,
    /// Row bits of the rank-0 die.
    pub cs0_row_bits: u32,
    /// Row bits of the rank-1 die, zero when unpopulated.
    pub cs1_row_bits: u32,
    /// Die uses the reduced 3/4 row space.
    pub row_3_4: bool,
}

impl ChannelInfo {
    /// Approximate per-die capacity in megabits, used for tRFC selection.
    pub fn die_capacity_mbits(&self) -> u32 {
        if self.cs0_row_bits == 0 || self.col_bits == 0 {
            return 0;
        }
        // capacity = rows * cols * banks * 16 bits of width, per die
        let bits = 1u64 << (self.cs0_row_bits + self.col_bits + self.bank_bits);
        let bits = bits * 16;
        let bits = if self.row_3_4 { bits / 4 * 3 } else { bits };
        (bits >> 20) as u32
    }
}

/// Long-lived timing configuration snapshot.
///
/// Initialized once from live register readback plus per-type defaults,
/// then mutated in place by the orchestrator (frequency, DLL bypass) and
/// the low-power controller (ODT enable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingRelatedConfig {
    pub dram_type: DramType,
    /// Number of populated channels, 1 or 2.
    pub channel_count: usize,
    pub channel_info: [ChannelInfo; pac::CHANNEL_COUNT],
    /// Burst length in beats.
    pub burst_len: u32,
    /// Issue reads/writes with auto-precharge.
    pub auto_precharge: bool,
    /// PHY DLL bypass engaged for the current frequency.
    pub dll_bypass: bool,
    /// ODT termination enabled on the DRAM side.
    pub odt_enable: bool,
    /// Read DBI (data bus inversion), LPDDR4 only.
    pub read_dbi: bool,
    /// Write DBI, LPDDR4 only.
    pub write_dbi: bool,
    /// Current interface frequency in MHz.
    pub freq_mhz: u32,
}

/// Decoded electrical settings plus the software low-power idle thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrvOdtLpConfig {
    /// DRAM output drive strength, ohms.
    pub dram_drv_ohm: u32,
    /// DRAM termination, ohms; zero when disabled.
    pub dram_odt_ohm: u32,
    /// DRAM CA bus termination (LPDDR4), ohms.
    pub dram_ca_odt_ohm: u32,
    /// PHY data-lane drive strength, ohms.
    pub phy_dq_drv_ohm: u32,
    /// PHY command/address drive strength, ohms.
    pub phy_ca_drv_ohm: u32,
    /// PHY receiver termination, ohms.
    pub phy_odt_ohm: u32,
    /// Idle thresholds gating automatic low-power entry. Zero disables the
    /// respective state.
    pub pd_idle: u32,
    pub sr_idle: u32,
    pub sr_mc_gate_idle: u32,
    pub srpd_lite_idle: u32,
    pub standby_idle: u32,
}

/// Top-level DFS status: which frequency-set slot drives the bus and what
/// each slot was last programmed to.
///
/// Invariant: exactly one slot is current, and `index_freq[current_index]`
/// is the frequency actually on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DramStatus {
    pub current_index: usize,
    /// Last-programmed frequency of each slot, MHz.
    pub index_freq: [u32; 2],
    /// Frequency the system booted at, the highest-margin setting.
    pub boot_freq_mhz: u32,
    /// Packed per-channel low-power state, see [low_power].
    pub low_power_stat: u32,
}

/// Suspend-scoped snapshot, captured on suspend entry and consumed at
/// resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspendSnapshot {
    pub freq_mhz: u32,
    pub low_power_stat: u32,
    pub odt_enable: bool,
}
