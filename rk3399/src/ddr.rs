//! # DDR controller, PHY interface and PHY register banks
//!
//! Each of the two channels carries three register banks at a fixed spacing:
//! the memory controller (CTL), the PHY-interface shim (PI) and the PHY
//! itself. The banks are dense arrays of 32-bit words; most words pack
//! several independent timing fields and many of them exist twice, once per
//! frequency-set slot. The engine crate addresses the banks through
//! descriptor tables, so this module only models the handful of registers
//! with state-machine semantics.
use arbitrary_int::{u3, u7, u12};

/// Channel 0 register window. Channel 1 follows at [DDRC_CH_SPACING].
pub const DDRC_CH0_BASE_ADDR: usize = 0xFFA8_0000;
pub const DDRC_CH_SPACING: usize = 0x8000;

/// Byte offsets of the three banks inside a channel window.
pub const CTL_BYTE_OFFSET: usize = 0x0000;
pub const PI_BYTE_OFFSET: usize = 0x0800;
pub const PHY_BYTE_OFFSET: usize = 0x2000;

/// Word counts of the three banks.
pub const CTL_REG_COUNT: usize = 332;
pub const PI_REG_COUNT: usize = 200;
pub const PHY_REG_COUNT: usize = 959;

/// Base address of a channel's CTL bank.
#[inline]
pub const fn ctl_base(channel: usize) -> usize {
    DDRC_CH0_BASE_ADDR + channel * DDRC_CH_SPACING + CTL_BYTE_OFFSET
}

/// Base address of a channel's PI bank.
#[inline]
pub const fn pi_base(channel: usize) -> usize {
    DDRC_CH0_BASE_ADDR + channel * DDRC_CH_SPACING + PI_BYTE_OFFSET
}

/// Base address of a channel's PHY bank.
#[inline]
pub const fn phy_base(channel: usize) -> usize {
    DDRC_CH0_BASE_ADDR + channel * DDRC_CH_SPACING + PHY_BYTE_OFFSET
}

/// CTL word holding the low-power command and status fields.
pub const CTL_LP_STATE: usize = 100;
/// CTL word with the automatic low-power entry enables.
pub const CTL_LP_AUTO: usize = 101;
/// CTL word accepting explicit low-power commands.
pub const CTL_LP_CMD: usize = 93;
/// CTL word with the power-down / self-refresh-power-down idle thresholds.
pub const CTL_LP_PD_IDLE: usize = 102;
/// CTL word with the self-refresh idle thresholds.
pub const CTL_LP_SR_IDLE: usize = 103;
/// CTL word with the mode-register-read busy flag.
pub const CTL_MRR_STATUS: usize = 200;

/// CTL words mirroring the DRAM mode registers after init/training.
pub const CTL_MR1_SHADOW: usize = 60;
pub const CTL_MR3_SHADOW: usize = 61;
pub const CTL_MR11_SHADOW: usize = 62;

/// CTL word reporting which frequency-set slot currently drives the bus.
pub const CTL_FREQ_SET_STATUS: usize = 111;

/// Explicit low-power command code requesting a full low-power exit.
pub const LP_CMD_EXIT_VALUE: u8 = 0x69;
/// `lp_state` value reporting the idle (no low-power) state.
pub const LP_STATE_IDLE: u8 = 0x40;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct LpState {
    /// Current low-power command-state machine value.
    #[bits(24..=30, r)]
    lp_cmd_state: u7,
    /// Set once a self-refresh exit has completed.
    #[bit(17, r)]
    sr_exit_done: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct LpAuto {
    /// Automatic self-refresh with memory-clock gating.
    #[bit(2, rw)]
    auto_sr_mc_gate: bool,
    /// Automatic self-refresh entry.
    #[bit(1, rw)]
    auto_sr: bool,
    /// Automatic power-down entry.
    #[bit(0, rw)]
    auto_pd: bool,
}

impl LpAuto {
    /// The three auto-entry enables as a packed 3-bit group.
    pub const MASK: u32 = 0b111;
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct LpCommand {
    /// Command opcode consumed by the low-power state machine.
    #[bits(24..=31, rw)]
    lp_cmd: u8,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct LpPdIdle {
    /// Self-refresh-power-down-lite idle threshold, in controller cycles.
    #[bits(16..=27, rw)]
    srpd_lite_idle: u12,
    /// Power-down idle threshold, in controller cycles.
    #[bits(0..=11, rw)]
    pd_idle: u12,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct LpSrIdle {
    /// Standby idle threshold, in controller cycles.
    #[bits(16..=31, rw)]
    standby_idle: u16,
    /// Self-refresh with memory-clock gate idle threshold.
    #[bits(8..=15, rw)]
    sr_mc_gate_idle: u8,
    /// Self-refresh idle threshold, in units of 32 controller cycles.
    #[bits(0..=7, rw)]
    sr_idle: u8,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MrrStatus {
    /// Mode-register access in flight.
    #[bit(0, r)]
    busy: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct FreqSetStatus {
    /// Frequency-set slot currently serving the bus.
    #[bit(4, r)]
    current_index: bool,
    /// Geometry readback, 12 minus the column address bits.
    #[bits(0..=2, r)]
    col_diff: u3,
}
