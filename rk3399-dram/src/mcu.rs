//! # M0 coprocessor handoff
//!
//! The actual PLL switch cannot run on the application cores: the code
//! performing it must keep executing while DRAM is unavailable. It is
//! delegated to the PMU M0 microcontroller, which runs from PMU SRAM. The
//! engine fills a shared parameter block with the target PLL settings and
//! slot index, releases the M0, and polls for its completion flag plus the
//! CIC's switch-done status.
//!
//! The capability is a trait so the orchestrator can be driven against a
//! recording stand-in on the host.
use rk3399::{
    cic::{Cic, MmioCic, regs::CicControl0},
    cru::{self, DpllCon0, DpllCon1, DpllCon3, PllWorkMode},
    pmu::m0,
};

use crate::{
    regs::RegisterBank,
    wait::{WaitPolicy, WaitTimeout, wait_for},
};

use arbitrary_int::{u2, u3, u6, u12};

/// Everything the M0 needs for one frequency switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfsHandoff {
    pub fbdiv: u32,
    pub refdiv: u32,
    pub postdiv1: u32,
    pub postdiv2: u32,
    pub target_mhz: u32,
    /// Frequency-set slot the switch lands on, 0 or 1.
    pub freq_set_index: u32,
    /// M0 routine selector, [m0::FUNC_DRAM_DFS] or [m0::FUNC_SUSPEND].
    pub func: u32,
}

impl DfsHandoff {
    /// DPLL control words as the M0 writes them, with the Rockchip
    /// write-mask halves composed in.
    pub fn dpll_words(&self) -> (u32, u32, u32) {
        let con0 = DpllCon0::default().with_fbdiv(u12::new(self.fbdiv as u16));
        let con1 = DpllCon1::default()
            .with_postdiv2(u3::new(self.postdiv2 as u8))
            .with_postdiv1(u3::new(self.postdiv1 as u8))
            .with_refdiv(u6::new(self.refdiv as u8));
        let con3 = DpllCon3::default()
            .with_work_mode(PllWorkMode::Normal)
            .with_dsmpd(true);
        (
            cru::write_masked(con0.raw_value() as u16, 0x0FFF),
            cru::write_masked(con1.raw_value() as u16, 0x773F),
            cru::write_masked(con3.raw_value() as u16, 0x0308),
        )
    }
}

/// The low-power microcontroller capability used by the orchestrator.
pub trait LowPowerMcu {
    /// Publish the handoff parameters for the next run.
    fn configure(&mut self, handoff: &DfsHandoff);
    /// Release the coprocessor and arm the hardware switch.
    fn start(&mut self);
    /// Block until the coprocessor reports completion and the switch state
    /// machine has settled.
    fn await_completion(&mut self, wait: WaitPolicy) -> Result<(), WaitTimeout>;
    /// Put the coprocessor back into reset.
    fn stop(&mut self);
}

/// The real M0 behind [LowPowerMcu].
pub struct M0 {
    params: RegisterBank,
    sgrf: RegisterBank,
    cic: MmioCic<'static>,
}

impl M0 {
    /// Map the fixed M0 control windows.
    ///
    /// # Safety
    ///
    /// Must only be constructed once per firmware lifetime, in the secure
    /// world, after the M0 image has been loaded into PMU SRAM.
    pub unsafe fn new_fixed() -> Self {
        // Safety: fixed SoC windows, exclusivity delegated to the caller.
        unsafe {
            Self {
                params: RegisterBank::new(
                    (m0::M0_BINCODE_BASE_ADDR + m0::PARAM_OFFSET) as *mut u32,
                    m0::PARAM_WORD_COUNT,
                ),
                sgrf: RegisterBank::new(
                    rk3399::pmu::SGRF_BASE_ADDR as *mut u32,
                    m0::SGRF_M0_BOOT_ADDR + 1,
                ),
                cic: Cic::new_mmio_fixed(),
            }
        }
    }
}

impl LowPowerMcu for M0 {
    fn configure(&mut self, handoff: &DfsHandoff) {
        let (con0, con1, con3) = handoff.dpll_words();
        self.params.write(m0::PARAM_DRAM_FREQ, handoff.target_mhz);
        self.params.write(m0::PARAM_DPLL_CON0, con0);
        self.params.write(m0::PARAM_DPLL_CON1, con1);
        self.params.write(m0::PARAM_DPLL_CON3, con3);
        self.params
            .write(m0::PARAM_FREQ_SELECT, handoff.freq_set_index << 4);
        self.params.write(m0::PARAM_M0_DONE, 0);
        self.params.write(m0::PARAM_M0_FUNC, handoff.func);
        // Point the M0 at its image before it leaves reset.
        self.sgrf.write(
            m0::SGRF_M0_BOOT_ADDR,
            cru::write_masked((m0::M0_BINCODE_BASE_ADDR >> 16) as u16, 0xFFFF),
        );
        // Select the slot on the CIC side while traffic still flows.
        let index = u2::new(handoff.freq_set_index as u8);
        self.cic.write_ctrl0(
            CicControl0::default()
                .with_write_mask(1 << 4 | 1 << 5)
                .with_freq_set_index(index),
        );
    }

    fn start(&mut self) {
        // Ungate the clock, then drop reset.
        self.sgrf.write(
            m0::SGRF_M0_CON0,
            cru::write_masked(0, m0::M0_CON_CLK_GATE),
        );
        self.sgrf
            .write(m0::SGRF_M0_CON0, cru::write_masked(0, m0::M0_CON_RESET));
        self.cic.write_ctrl0(
            CicControl0::default()
                .with_write_mask(1 << 0)
                .with_start_dfs(true),
        );
    }

    fn await_completion(&mut self, wait: WaitPolicy) -> Result<(), WaitTimeout> {
        let params = &self.params;
        wait_for(wait, || params.read(m0::PARAM_M0_DONE) == m0::DONE_FLAG)?;
        let cic = &self.cic;
        wait_for(wait, || cic.read_status0().dfs_done())
    }

    fn stop(&mut self) {
        self.sgrf.write(
            m0::SGRF_M0_CON0,
            cru::write_masked(
                m0::M0_CON_RESET | m0::M0_CON_CLK_GATE,
                m0::M0_CON_RESET | m0::M0_CON_CLK_GATE,
            ),
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpll_words_carry_write_masks() {
        let handoff = DfsHandoff {
            fbdiv: 50,
            refdiv: 1,
            postdiv1: 2,
            postdiv2: 1,
            target_mhz: 600,
            freq_set_index: 1,
            func: m0::FUNC_DRAM_DFS,
        };
        let (con0, con1, con3) = handoff.dpll_words();
        assert_eq!(con0, 0x0FFF_0000 | 50);
        assert_eq!(con1 & 0xFFFF, (1 << 12) | (2 << 8) | 1);
        assert_eq!(con1 >> 16, 0x773F);
        // Integer mode, normal work mode.
        assert_eq!(con3 & 0xFFFF, (0b01 << 8) | (1 << 3));
    }
}
