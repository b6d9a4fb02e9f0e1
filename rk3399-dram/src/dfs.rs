//! # Frequency-switch orchestration
//!
//! [DramDfs] is the engine's only long-lived state. A switch programs the
//! full timing set into the frequency-set slot the bus is *not* using,
//! arms the PI training machines, and hands the atomic PLL change to the
//! M0; only after the coprocessor reports success does the slot become
//! current. The active slot's registers are never written during a switch,
//! so a failed or interrupted handoff leaves the bus on a fully valid
//! configuration.
use log::{debug, warn};
use rk3399::{
    cru::{self, DpllCon0, DpllCon1, DpllCon3, PllWorkMode},
    ddr,
    pmu::m0,
};

use crate::{
    ChannelInfo, DramStatus, DramType, DrvOdtLpConfig, SuspendSnapshot, TimingRelatedConfig,
    low_power,
    mcu::{self, LowPowerMcu},
    odt,
    prog::{FreqSetSlot, ctl, phy, pi},
    regs::DramRegs,
    timing,
    wait::{WaitPolicy, WaitTimeout},
};

/// Crystal feeding the DPLL reference input.
pub const XIN_MHZ: u32 = 24;

/// One supported DPLL setting: output frequency and its divider chain.
#[derive(Debug, Clone, Copy)]
pub struct PllDividers {
    pub mhz: u32,
    pub fbdiv: u32,
    pub refdiv: u32,
    pub postdiv1: u32,
    pub postdiv2: u32,
}

/// The supported operating points, descending. Every entry satisfies
/// `mhz == XIN_MHZ * fbdiv / (refdiv * postdiv1 * postdiv2)` exactly.
pub const DPLL_RATES: [PllDividers; 9] = [
    PllDividers { mhz: 928, fbdiv: 116, refdiv: 1, postdiv1: 3, postdiv2: 1 },
    PllDividers { mhz: 800, fbdiv: 100, refdiv: 1, postdiv1: 3, postdiv2: 1 },
    PllDividers { mhz: 732, fbdiv: 61, refdiv: 1, postdiv1: 2, postdiv2: 1 },
    PllDividers { mhz: 666, fbdiv: 111, refdiv: 1, postdiv1: 4, postdiv2: 1 },
    PllDividers { mhz: 600, fbdiv: 50, refdiv: 1, postdiv1: 2, postdiv2: 1 },
    PllDividers { mhz: 528, fbdiv: 66, refdiv: 1, postdiv1: 3, postdiv2: 1 },
    PllDividers { mhz: 400, fbdiv: 50, refdiv: 1, postdiv1: 3, postdiv2: 1 },
    PllDividers { mhz: 300, fbdiv: 25, refdiv: 1, postdiv1: 2, postdiv2: 1 },
    PllDividers { mhz: 200, fbdiv: 25, refdiv: 1, postdiv1: 3, postdiv2: 1 },
];

/// Quantize a requested frequency to the operating-point table: the
/// largest supported rate not above the request, or the lowest rate when
/// the request undershoots the whole table.
pub fn round_rate_mhz(mhz: u32) -> u32 {
    for entry in &DPLL_RATES {
        if entry.mhz <= mhz {
            return entry.mhz;
        }
    }
    DPLL_RATES[DPLL_RATES.len() - 1].mhz
}

fn dividers_for(mhz: u32) -> &'static PllDividers {
    for entry in &DPLL_RATES {
        if entry.mhz == mhz {
            return entry;
        }
    }
    &DPLL_RATES[DPLL_RATES.len() - 1]
}

/// Interface frequency currently produced by the DPLL, from live register
/// readback.
pub fn dpll_rate_mhz(regs: &DramRegs) -> u32 {
    let con3 = DpllCon3::new_with_raw_value(regs.cru_dpll.read(cru::DPLL_CON3));
    match con3.work_mode() {
        Ok(PllWorkMode::Slow) => XIN_MHZ,
        Ok(PllWorkMode::DeepSlow) => 0,
        _ => {
            let con0 = DpllCon0::new_with_raw_value(regs.cru_dpll.read(cru::DPLL_CON0));
            let con1 = DpllCon1::new_with_raw_value(regs.cru_dpll.read(cru::DPLL_CON1));
            let fbdiv = con0.fbdiv().value() as u32;
            let div = con1.refdiv().value() as u32
                * con1.postdiv1().value() as u32
                * con1.postdiv2().value() as u32;
            if div == 0 { 0 } else { XIN_MHZ * fbdiv / div }
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DfsError {
    #[error("busy-wait bound exhausted")]
    Timeout(#[from] WaitTimeout),
    #[error("no hardware frequency-set slot for index {0}")]
    InvalidSlot(usize),
    #[error("resume requested without a suspend snapshot")]
    NotSuspended,
}

/// The DFS engine context. All state is owned here; the caller decides
/// where the single instance lives.
pub struct DramDfs<M: LowPowerMcu> {
    pub status: DramStatus,
    pub config: TimingRelatedConfig,
    pub drv_odt_lp: DrvOdtLpConfig,
    pub regs: DramRegs,
    pub mcu: M,
    pub wait: WaitPolicy,
    suspend: Option<SuspendSnapshot>,
    dqs_cache: phy::DllBypassCache,
}

impl<M: LowPowerMcu> DramDfs<M> {
    /// Capture the running controller state and bring up the engine.
    ///
    /// The loader already initialized and trained the DRAM; this reads back
    /// which slot is live, the column geometry, the electrical settings the
    /// loader negotiated, and the frequency on the bus, then applies the
    /// configured low-power idle thresholds.
    pub fn init(
        dram_type: DramType,
        channel_count: usize,
        mut channel_info: [ChannelInfo; 2],
        idle: &DrvOdtLpConfig,
        mut regs: DramRegs,
        mcu: M,
        wait: WaitPolicy,
    ) -> Self {
        let fss = ddr::FreqSetStatus::new_with_raw_value(
            regs.ctl[0].read(ddr::CTL_FREQ_SET_STATUS),
        );
        let current_index = fss.current_index() as usize;

        for info in channel_info.iter_mut().take(channel_count) {
            // Column readback is authoritative over the board description.
            info.col_bits = 12 - fss.col_diff().value() as u32;
        }

        let mut drv_odt_lp = odt::get_dram_drv_odt_val(dram_type, &regs.ctl[0]);
        drv_odt_lp.pd_idle = idle.pd_idle;
        drv_odt_lp.sr_idle = idle.sr_idle;
        drv_odt_lp.sr_mc_gate_idle = idle.sr_mc_gate_idle;
        drv_odt_lp.srpd_lite_idle = idle.srpd_lite_idle;
        drv_odt_lp.standby_idle = idle.standby_idle;

        let boot_freq_mhz = dpll_rate_mhz(&regs);
        let config = TimingRelatedConfig {
            dram_type,
            channel_count,
            channel_info,
            burst_len: if dram_type == DramType::Lpddr4 { 16 } else { 8 },
            auto_precharge: false,
            dll_bypass: boot_freq_mhz < phy::DLL_BYPASS_THRESHOLD_MHZ,
            odt_enable: drv_odt_lp.dram_odt_ohm != 0,
            read_dbi: false,
            write_dbi: false,
            freq_mhz: boot_freq_mhz,
        };

        let low_power_stat = low_power::dram_low_power_config(&mut regs, &config, &drv_odt_lp);

        let mut index_freq = [0; 2];
        index_freq[current_index] = boot_freq_mhz;
        Self {
            status: DramStatus {
                current_index,
                index_freq,
                boot_freq_mhz,
                low_power_stat,
            },
            config,
            drv_odt_lp,
            regs,
            mcu,
            wait,
            suspend: None,
            dqs_cache: phy::DllBypassCache::default(),
        }
    }

    /// The rate [set_rate](Self::set_rate) would settle on for `mhz`.
    pub fn round_rate(&self, mhz: u32) -> u32 {
        round_rate_mhz(mhz)
    }

    /// Frequency currently on the bus, from DPLL readback.
    pub fn current_rate(&self) -> u32 {
        dpll_rate_mhz(&self.regs)
    }

    /// Switch the interface to (the quantized version of) `mhz`. Returns
    /// the rate actually set.
    pub fn set_rate(&mut self, mhz: u32) -> Result<u32, DfsError> {
        let target = round_rate_mhz(mhz);
        if target == self.config.freq_mhz {
            return Ok(target);
        }
        let current = FreqSetSlot::from_index(self.status.current_index)
            .ok_or(DfsError::InvalidSlot(self.status.current_index))?;
        let slot = current.other();
        debug!(
            "dram dfs: {} -> {} MHz via slot {}",
            self.config.freq_mhz,
            target,
            slot.index()
        );

        let saved_lp = low_power::exit_low_power(&mut self.regs, &self.config, self.wait)?;
        let result = self.switch_to(target, slot);
        // Training must never stay armed, whatever happened to the switch.
        for channel in 0..self.config.channel_count {
            pi::disable_training(&mut self.regs.pi[channel]);
        }
        low_power::resume_low_power(&mut self.regs, &self.config, saved_lp);

        match result {
            Ok(()) => {
                self.status.current_index = slot.index();
                self.status.index_freq[slot.index()] = target;
                self.config.freq_mhz = target;
                self.config.dll_bypass = target < phy::DLL_BYPASS_THRESHOLD_MHZ;
                Ok(target)
            }
            Err(e) => {
                warn!("dram dfs: switch to {target} MHz failed: {e}");
                Err(e)
            }
        }
    }

    fn switch_to(&mut self, target: u32, slot: FreqSetSlot) -> Result<(), DfsError> {
        if self.config.odt_enable {
            for channel in 0..self.config.channel_count {
                phy::set_odt_drive(&mut self.regs.phy[channel], true);
            }
        }

        let spec = timing::dram_get_parameter(&self.config, target);
        for channel in 0..self.config.channel_count {
            ctl::program(&mut self.regs.ctl[channel], &spec, &self.config, slot);
            pi::program(&mut self.regs.pi[channel], &spec, &self.config, slot);
            phy::program(
                &mut self.regs.phy[channel],
                &spec,
                &self.config,
                &self.drv_odt_lp,
            );
            phy::dll_bypass(
                &mut self.regs.phy[channel],
                channel,
                slot,
                target,
                &mut self.dqs_cache,
            );
            pi::enable_training(&mut self.regs.pi[channel], self.config.dram_type);
        }

        let result = self.run_mcu(target, slot, m0::FUNC_DRAM_DFS);

        for channel in 0..self.config.channel_count {
            phy::set_odt_drive(&mut self.regs.phy[channel], self.config.odt_enable);
        }
        result
    }

    fn stage_mcu(&mut self, target: u32, slot: FreqSetSlot, func: u32) {
        let div = dividers_for(target);
        self.mcu.configure(&mcu::DfsHandoff {
            fbdiv: div.fbdiv,
            refdiv: div.refdiv,
            postdiv1: div.postdiv1,
            postdiv2: div.postdiv2,
            target_mhz: target,
            freq_set_index: slot.index() as u32,
            func,
        });
    }

    fn run_mcu(&mut self, target: u32, slot: FreqSetSlot, func: u32) -> Result<(), DfsError> {
        self.stage_mcu(target, slot, func);
        self.mcu.start();
        let outcome = self.mcu.await_completion(self.wait);
        self.mcu.stop();
        Ok(outcome?)
    }

    /// Runtime update of the low-power idle thresholds and the ODT enable,
    /// from the packed SMC argument encoding (see [low_power::set_odt_pd]).
    pub fn set_odt_pd(&mut self, arg0: u32, arg1: u32, arg2: u32) -> Result<u32, DfsError> {
        self.status.low_power_stat = low_power::set_odt_pd(
            &mut self.regs,
            &mut self.config,
            &mut self.drv_odt_lp,
            self.wait,
            arg0,
            arg1,
            arg2,
        )?;
        Ok(self.status.low_power_stat)
    }

    /// Park the DRAM for system suspend: return to the boot frequency with
    /// termination active (the highest-margin configuration the loader
    /// validated), mirror it into the other slot so the resume path finds
    /// valid timing in both, and stage the M0 suspend routine.
    pub fn prepare_suspend(&mut self) -> Result<(), DfsError> {
        let snapshot = SuspendSnapshot {
            freq_mhz: self.config.freq_mhz,
            low_power_stat: self.status.low_power_stat,
            odt_enable: self.config.odt_enable,
        };
        self.config.odt_enable = true;
        self.set_rate(self.status.boot_freq_mhz)?;

        let spec = timing::dram_get_parameter(&self.config, self.status.boot_freq_mhz);
        let other = FreqSetSlot::from_index(self.status.current_index)
            .ok_or(DfsError::InvalidSlot(self.status.current_index))?
            .other();
        for channel in 0..self.config.channel_count {
            ctl::program(&mut self.regs.ctl[channel], &spec, &self.config, other);
            pi::program(&mut self.regs.pi[channel], &spec, &self.config, other);
        }
        self.status.index_freq[other.index()] = self.status.boot_freq_mhz;

        // Stage only: the platform suspend finisher releases the M0 once
        // the application cores are down, and the routine runs while they
        // are. Starting and awaiting it here would deadlock.
        self.stage_mcu(self.status.boot_freq_mhz, other, m0::FUNC_SUSPEND);
        self.suspend = Some(snapshot);
        Ok(())
    }

    /// Undo [prepare_suspend](Self::prepare_suspend): restore the
    /// pre-suspend frequency, termination and low-power states.
    ///
    /// The slot index and the live rate are re-read from hardware first;
    /// depending on the platform the controller state may have been
    /// preserved or reset across the suspend. A full switch only runs when
    /// the live rate differs from the pre-suspend one.
    pub fn prepare_resume(&mut self) -> Result<(), DfsError> {
        let snapshot = self.suspend.take().ok_or(DfsError::NotSuspended)?;
        let fss = ddr::FreqSetStatus::new_with_raw_value(
            self.regs.ctl[0].read(ddr::CTL_FREQ_SET_STATUS),
        );
        self.status.current_index = fss.current_index() as usize;
        self.config.freq_mhz = dpll_rate_mhz(&self.regs);
        self.status.index_freq[self.status.current_index] = self.config.freq_mhz;

        self.config.odt_enable = snapshot.odt_enable;
        if self.config.freq_mhz != snapshot.freq_mhz {
            self.set_rate(snapshot.freq_mhz)?;
        }
        // Re-write the idle thresholds (the controller may have been reset
        // across the suspend), then re-arm exactly the set that was active
        // before it rather than what the thresholds alone would imply.
        low_power::dram_low_power_config(&mut self.regs, &self.config, &self.drv_odt_lp);
        low_power::resume_low_power(&mut self.regs, &self.config, snapshot.low_power_stat);
        self.status.low_power_stat = snapshot.low_power_stat;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use crate::mcu::testing::MockMcu;
    use crate::regs::testing::FakeDram;

    /// Populate `fake` with a trained, idle controller running at
    /// `boot_mhz` on `current_index` and bring an engine up over it.
    pub fn boot_engine(
        fake: &mut FakeDram,
        boot_mhz: u32,
        current_index: u32,
    ) -> DramDfs<MockMcu> {
        let div = dividers_for(boot_mhz);
        fake.cru_dpll[cru::DPLL_CON0] = div.fbdiv;
        fake.cru_dpll[cru::DPLL_CON1] =
            (div.postdiv2 << 12) | (div.postdiv1 << 8) | div.refdiv;
        fake.cru_dpll[cru::DPLL_CON3] = 0b01 << 8;
        for channel in 0..2 {
            fake.ctl[channel][ddr::CTL_FREQ_SET_STATUS] = current_index << 4;
            // Idle low-power state machine, self-refresh exit done.
            fake.ctl[channel][ddr::CTL_LP_STATE] =
                ((ddr::LP_STATE_IDLE as u32) << 24) | (1 << 17);
        }
        let idle = DrvOdtLpConfig {
            sr_idle: 5,
            pd_idle: 10,
            ..Default::default()
        };
        DramDfs::init(
            DramType::Lpddr3,
            2,
            [ChannelInfo {
                rank_count: 2,
                col_bits: 10,
                bank_bits: 3,
                cs0_row_bits: 15,
                cs1_row_bits: 15,
                row_3_4: false,
            }; 2],
            &idle,
            fake.regs(),
            MockMcu::new(),
            WaitPolicy::Bounded(64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::boot_engine;
    use super::*;
    use crate::regs::testing::FakeDram;

    #[test]
    fn round_rate_quantizes_downward() {
        assert_eq!(round_rate_mhz(650), 600);
        assert_eq!(round_rate_mhz(928), 928);
        assert_eq!(round_rate_mhz(2000), 928);
        assert_eq!(round_rate_mhz(100), 200);
        assert_eq!(round_rate_mhz(300), 300);
    }

    #[test]
    fn divider_table_is_exact() {
        for d in &DPLL_RATES {
            assert_eq!(
                XIN_MHZ * d.fbdiv,
                d.mhz * d.refdiv * d.postdiv1 * d.postdiv2,
                "inexact dividers for {} MHz",
                d.mhz
            );
        }
    }

    #[test]
    fn init_captures_boot_state() {
        let mut fake = FakeDram::new();
        let dfs = boot_engine(&mut fake, 800, 0);
        assert_eq!(dfs.status.current_index, 0);
        assert_eq!(dfs.status.boot_freq_mhz, 800);
        assert_eq!(dfs.status.index_freq, [800, 0]);
        assert_eq!(dfs.config.freq_mhz, 800);
        assert!(!dfs.config.dll_bypass);
        assert_ne!(dfs.status.low_power_stat, 0);
    }

    #[test]
    fn set_rate_programs_inactive_slot_and_flips() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);

        assert_eq!(dfs.set_rate(600), Ok(600));
        assert_eq!(dfs.status.current_index, 1);
        assert_eq!(dfs.status.index_freq, [800, 600]);
        assert_eq!(dfs.config.freq_mhz, 600);

        let handoff = dfs.mcu.last_handoff().unwrap();
        assert_eq!(handoff.target_mhz, 600);
        assert_eq!(handoff.freq_set_index, 1);
        assert_eq!(handoff.fbdiv, 50);
        assert_eq!(handoff.func, m0::FUNC_DRAM_DFS);
        assert_eq!(dfs.mcu.starts, 1);
        assert_eq!(dfs.mcu.stops, 1);

        // Training is disarmed on the way out.
        for channel in 0..2 {
            assert_eq!(dfs.regs.pi[channel].read_field(pi::WRLVL_EN), 0);
        }
        // The F1 slot carries the new timing.
        let spec = timing::dram_get_parameter(&dfs.config, 600);
        let f1 = ctl::ctl_fields(FreqSetSlot::F1);
        assert_eq!(dfs.regs.ctl[0].read_field(f1.cl), spec.cl);
    }

    #[test]
    fn set_rate_is_idempotent() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        assert_eq!(dfs.set_rate(600), Ok(600));
        assert_eq!(dfs.mcu.handoff_count, 1);
        assert_eq!(dfs.set_rate(640), Ok(600));
        assert_eq!(dfs.mcu.handoff_count, 1, "no second handoff for a no-op");
    }

    #[test]
    fn active_slot_is_never_touched() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        assert_eq!(dfs.set_rate(600), Ok(600));

        // Now on F1 at 600; record every F1 field, then switch again.
        let before: [u32; 47] =
            core::array::from_fn(|i| dfs.regs.ctl[0].read_field(ctl::all_fields(FreqSetSlot::F1)[i]));
        assert_eq!(dfs.set_rate(400), Ok(400));
        for (i, f) in ctl::all_fields(FreqSetSlot::F1).iter().enumerate() {
            assert_eq!(
                dfs.regs.ctl[0].read_field(*f),
                before[i],
                "F1 field {f:?} changed while F0 was being programmed"
            );
        }
    }

    #[test]
    fn failed_handoff_keeps_current_slot() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        dfs.mcu.fail_completion = true;

        assert_eq!(dfs.set_rate(600), Err(DfsError::Timeout(WaitTimeout)));
        assert_eq!(dfs.status.current_index, 0);
        assert_eq!(dfs.config.freq_mhz, 800);
        // The coprocessor was stopped and training disarmed regardless.
        assert_eq!(dfs.mcu.stops, 1);
        for channel in 0..2 {
            assert_eq!(dfs.regs.pi[channel].read_field(pi::WRLVL_EN), 0);
        }
    }

    #[test]
    fn suspend_returns_to_boot_frequency_and_resume_restores() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        assert_eq!(dfs.set_rate(400), Ok(400));
        dfs.config.odt_enable = false;

        dfs.prepare_suspend().unwrap();
        assert_eq!(dfs.config.freq_mhz, 800);
        assert!(dfs.config.odt_enable);
        assert_eq!(dfs.status.index_freq, [800, 800]);
        let staged = dfs.mcu.last_handoff().unwrap();
        assert_eq!(staged.func, m0::FUNC_SUSPEND);
        // The suspend routine is only staged; the platform suspend finisher
        // starts the coprocessor. Both starts came from the rate switches.
        assert_eq!(dfs.mcu.starts, 2);
        assert_eq!(dfs.mcu.stops, 2);

        dfs.prepare_resume().unwrap();
        assert_eq!(dfs.config.freq_mhz, 400);
        assert!(!dfs.config.odt_enable);
        assert_eq!(dfs.prepare_resume(), Err(DfsError::NotSuspended));
    }

    #[test]
    fn resume_restores_presuspend_low_power_state() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        let before = dfs.status.low_power_stat;
        assert_ne!(before, 0);

        dfs.prepare_suspend().unwrap();
        // Thresholds changed while suspended; the armed set must still come
        // from the snapshot, not be re-derived from the new thresholds.
        dfs.drv_odt_lp.sr_idle = 0;
        dfs.prepare_resume().unwrap();

        assert_eq!(dfs.status.low_power_stat, before);
        let auto =
            ddr::LpAuto::new_with_raw_value(dfs.regs.ctl[0].read(ddr::CTL_LP_AUTO));
        assert!(auto.auto_sr());
        assert!(auto.auto_pd());
    }

    #[test]
    fn low_rate_engages_dll_bypass() {
        let mut fake = FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        assert_eq!(dfs.set_rate(200), Ok(200));
        assert!(dfs.config.dll_bypass);
        let slot = FreqSetSlot::F1;
        assert_eq!(dfs.regs.phy[0].read_field(phy::BYPASS_MODE_F1), 1);
        for lane in 0..phy::LANE_COUNT {
            assert_eq!(
                dfs.regs.phy[0].read_field(phy::wrdqs_slave_delay(lane, slot)),
                0
            );
        }
    }
}
