//! # CIC, the DFS handshake block
//!
//! The CIC sits between the memory scheduler and the clock tree. The
//! frequency-switch sequence asks it to quiesce outstanding bus traffic,
//! selects the target frequency-set slot and reports completion of the
//! PLL switch performed by the M0. Its control registers follow the
//! write-mask convention of [crate::cru].
use arbitrary_int::u2;

pub const CIC_BASE_ADDR: usize = 0xFF62_0000;

pub mod regs {
    use super::u2;

    #[bitbybit::bitfield(u32, default = 0x0, debug)]
    pub struct CicControl0 {
        /// Write-enable mask for the lower half. Reads back as zero.
        #[bits(16..=31, rw)]
        write_mask: u16,
        /// Target frequency-set slot for the next switch.
        #[bits(4..=5, rw)]
        freq_set_index: u2,
        /// Request the scheduler to idle outstanding transactions.
        #[bit(2, rw)]
        idle_request: bool,
        /// Arm the frequency-switch state machine.
        #[bit(0, rw)]
        start_dfs: bool,
    }

    #[bitbybit::bitfield(u32, default = 0x0, debug)]
    pub struct CicControl1 {
        /// Write-enable mask for the lower half. Reads back as zero.
        #[bits(16..=31, rw)]
        write_mask: u16,
        /// Per-channel standby-mode enable.
        #[bits(0..=1, rw)]
        standby_en: u2,
    }

    #[bitbybit::bitfield(u32, default = 0x0, debug)]
    pub struct CicStatus0 {
        /// Scheduler acknowledged the idle request.
        #[bit(2, r)]
        idle_ack: bool,
        /// The armed frequency switch has completed.
        #[bit(0, r)]
        dfs_done: bool,
    }
}

use regs::*;

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Cic {
    ctrl0: CicControl0,
    ctrl1: CicControl1,
    _reserved0: [u32; 0x2],
    #[mmio(PureRead)]
    status0: CicStatus0,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Cic>(), 0x14);

impl Cic {
    /// Create a new MMIO instance for the CIC block at [CIC_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to create multiple handles to the same block.
    /// The user must ensure that concurrent accesses do not interfere with
    /// each other.
    pub const unsafe fn new_mmio_fixed() -> MmioCic<'static> {
        unsafe { Self::new_mmio_at(CIC_BASE_ADDR) }
    }
}
