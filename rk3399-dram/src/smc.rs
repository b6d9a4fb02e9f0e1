//! # Secure-monitor-call dispatch
//!
//! The non-secure kernel drives the engine through a vendor SIP service.
//! The monitor's SMC handler strips the service OEN and forwards the
//! function number plus three arguments here. Frequencies cross the
//! boundary in Hz, matching the non-secure clock framework; the engine
//! works in MHz internally.
use log::warn;
use num_enum::TryFromPrimitive;

use crate::{
    dfs::DramDfs,
    mcu::LowPowerMcu,
    time::{Hertz, MegaHertz},
};

/// Function numbers of the DRAM SIP service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u64)]
pub enum DramSmcFunc {
    SetRate = 0x01,
    RoundRate = 0x02,
    GetRate = 0x05,
    SetOdtPd = 0x08,
}

/// Standard SMC status for an unimplemented function.
pub const SMC_UNKNOWN: i64 = -1;
/// Status for a recognized call that failed to execute.
pub const SMC_ERROR: i64 = -2;

/// An SMC result pair: status in `x0`, payload in `x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmcReturn {
    pub status: i64,
    pub value: u64,
}

impl SmcReturn {
    pub const fn ok(value: u64) -> Self {
        Self { status: 0, value }
    }

    pub const fn err(status: i64) -> Self {
        Self { status, value: 0 }
    }
}

/// Dispatch one DRAM SIP call against the engine.
pub fn handle_dram_smc<M: LowPowerMcu>(
    dfs: &mut DramDfs<M>,
    func_id: u64,
    arg0: u64,
    arg1: u64,
    arg2: u64,
) -> SmcReturn {
    let func = match DramSmcFunc::try_from_primitive(func_id) {
        Ok(func) => func,
        Err(_) => {
            warn!("dram smc: unknown function {func_id:#x}");
            return SmcReturn::err(SMC_UNKNOWN);
        }
    };
    match func {
        // Requests arrive in Hz; the settled rate is reported back in MHz,
        // except for the live-rate query which answers in Hz.
        DramSmcFunc::SetRate => {
            let request = Hertz::from_raw(arg0 as u32).to_MHz();
            match dfs.set_rate(request) {
                Ok(mhz) => SmcReturn::ok(mhz as u64),
                Err(e) => {
                    warn!("dram smc: set rate failed: {e}");
                    SmcReturn::err(SMC_ERROR)
                }
            }
        }
        DramSmcFunc::RoundRate => {
            let request = Hertz::from_raw(arg0 as u32).to_MHz();
            SmcReturn::ok(dfs.round_rate(request) as u64)
        }
        DramSmcFunc::GetRate => SmcReturn::ok(hz_value(dfs.current_rate())),
        // The status word stays secure-side state; success reports plain 0.
        DramSmcFunc::SetOdtPd => {
            match dfs.set_odt_pd(arg0 as u32, arg1 as u32, arg2 as u32) {
                Ok(_) => SmcReturn::ok(0),
                Err(e) => {
                    warn!("dram smc: odt/pd update failed: {e}");
                    SmcReturn::err(SMC_ERROR)
                }
            }
        }
    }
}

fn hz_value(mhz: u32) -> u64 {
    let hz: Hertz = MegaHertz::from_raw(mhz).convert();
    hz.raw() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfs::tests_support::boot_engine;

    #[test]
    fn unknown_function_is_rejected() {
        let mut fake = crate::regs::testing::FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        let ret = handle_dram_smc(&mut dfs, 0x42, 0, 0, 0);
        assert_eq!(ret, SmcReturn::err(SMC_UNKNOWN));
    }

    #[test]
    fn rate_calls_round_trip() {
        let mut fake = crate::regs::testing::FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);

        let ret = handle_dram_smc(&mut dfs, DramSmcFunc::RoundRate as u64, 650_000_000, 0, 0);
        assert_eq!(ret, SmcReturn::ok(600));

        let ret = handle_dram_smc(&mut dfs, DramSmcFunc::SetRate as u64, 650_000_000, 0, 0);
        assert_eq!(ret, SmcReturn::ok(600));
        assert_eq!(dfs.status.current_index, 1);

        // The live-rate query answers in Hz from DPLL readback; the stand-in
        // registers still hold the boot setting.
        let ret = handle_dram_smc(&mut dfs, DramSmcFunc::GetRate as u64, 0, 0, 0);
        assert_eq!(ret, SmcReturn::ok(800_000_000));
    }

    #[test]
    fn set_odt_pd_applies_thresholds_and_returns_zero() {
        let mut fake = crate::regs::testing::FakeDram::new();
        let mut dfs = boot_engine(&mut fake, 800, 0);
        let ret = handle_dram_smc(&mut dfs, DramSmcFunc::SetOdtPd as u64, 5, 10, 1);
        assert_eq!(ret, SmcReturn::ok(0));
        assert_eq!(dfs.drv_odt_lp.sr_idle, 5);
        assert_eq!(dfs.drv_odt_lp.pd_idle, 10);
        assert!(dfs.config.odt_enable);
    }
}
