//! # PMU-side control bits for DRAM low power and the M0 coprocessor
//!
//! Two slices of the power-management unit matter to the DFS engine: the
//! software-forced self-refresh request bits in `PMU_SFT_CON`, and the
//! secure-GRF words that hold the M0 microcontroller in reset and point it
//! at its execution address. The M0 firmware image itself is opaque; the
//! engine only exchanges a parameter block with it in PMU SRAM.

pub const PMU_BASE_ADDR: usize = 0xFF31_0000;
pub const SGRF_BASE_ADDR: usize = 0xFF33_0000;

/// Byte offset of `PMU_SFT_CON` inside the PMU block.
pub const PMU_SFT_CON_OFFSET: usize = 0x24;

/// Bit driving channel 0 into external self-refresh.
pub const SFT_CON_DDR_SREF_CH0: u32 = 1 << 8;
/// Bit driving channel 1 into external self-refresh.
pub const SFT_CON_DDR_SREF_CH1: u32 = 1 << 12;

/// Mask of a channel's external-self-refresh request in `PMU_SFT_CON`.
#[inline]
pub const fn sft_con_sref_bit(channel: usize) -> u32 {
    if channel == 0 {
        SFT_CON_DDR_SREF_CH0
    } else {
        SFT_CON_DDR_SREF_CH1
    }
}

pub mod m0 {
    //! M0 control words and the shared parameter block.
    //!
    //! The parameter block lives in PMU SRAM at a fixed offset known to the
    //! M0 firmware. The firmware polls `PARAM_M0_FUNC`, executes the
    //! requested routine and writes [DONE_FLAG] into `PARAM_M0_DONE`.

    /// PMU SRAM base holding the M0 image and the parameter block.
    pub const M0_BINCODE_BASE_ADDR: usize = 0xFF3B_0000;
    /// Byte offset of the shared parameter block.
    pub const PARAM_OFFSET: usize = 0xC00;
    /// Number of 32-bit words in the parameter block.
    pub const PARAM_WORD_COUNT: usize = 8;

    /// Parameter block word indices.
    pub const PARAM_DRAM_FREQ: usize = 0;
    pub const PARAM_DPLL_CON0: usize = 1;
    pub const PARAM_DPLL_CON1: usize = 2;
    pub const PARAM_DPLL_CON3: usize = 3;
    pub const PARAM_FREQ_SELECT: usize = 4;
    pub const PARAM_M0_DONE: usize = 5;
    pub const PARAM_M0_FUNC: usize = 6;

    /// Value the M0 writes into `PARAM_M0_DONE` on completion.
    pub const DONE_FLAG: u32 = 0xF59E_C20A;

    /// M0 routine selectors written into `PARAM_M0_FUNC`.
    pub const FUNC_DRAM_DFS: u32 = 0;
    pub const FUNC_SUSPEND: u32 = 1;

    /// SGRF word index gating the M0 clocks and resets.
    pub const SGRF_M0_CON0: usize = 0x60;
    /// SGRF word index selecting the M0 boot address (high bits).
    pub const SGRF_M0_BOOT_ADDR: usize = 0x61;

    /// `SGRF_M0_CON0` low-half bits, used with the write-mask convention.
    pub const M0_CON_RESET: u16 = 1 << 0;
    pub const M0_CON_CLK_GATE: u16 = 1 << 1;
}
