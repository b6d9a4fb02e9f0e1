//! # Clock and reset unit (CRU), DPLL register slice
//!
//! Only the DPLL control registers are modeled here; the rest of the CRU is
//! owned by the platform firmware. All CRU control registers use the
//! Rockchip write-mask convention: the upper 16 bits of a written value
//! select which of the lower 16 bits take effect.
use arbitrary_int::{u3, u6, u12, u24};

pub const CRU_BASE_ADDR: usize = 0xFF76_0000;

/// Byte offset of the DPLL control registers inside the CRU.
pub const DPLL_CON_OFFSET: usize = 0x40;

/// Word index of `DPLL_CON0` within the DPLL register slice.
pub const DPLL_CON0: usize = 0;
pub const DPLL_CON1: usize = 1;
pub const DPLL_CON2: usize = 2;
pub const DPLL_CON3: usize = 3;
pub const DPLL_CON4: usize = 4;
pub const DPLL_CON5: usize = 5;
/// Number of DPLL control words.
pub const DPLL_CON_COUNT: usize = 6;

/// Compose a value for a write-masked CRU register.
///
/// Every bit set in `mask` (a lower-16-bit mask) is unlocked for this write;
/// all other bits of the register are left untouched by hardware.
#[inline]
pub const fn write_masked(value: u16, mask: u16) -> u32 {
    ((mask as u32) << 16) | (value as u32 & mask as u32)
}

#[bitbybit::bitenum(u2, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum PllWorkMode {
    Slow = 0b00,
    Normal = 0b01,
    DeepSlow = 0b10,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DpllCon0 {
    /// Feedback divider.
    #[bits(0..=11, rw)]
    fbdiv: u12,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DpllCon1 {
    #[bits(12..=14, rw)]
    postdiv2: u3,
    #[bits(8..=10, rw)]
    postdiv1: u3,
    /// Reference divider.
    #[bits(0..=5, rw)]
    refdiv: u6,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DpllCon2 {
    /// PLL lock indication, read-only in hardware.
    #[bit(31, r)]
    locked: bool,
    #[bits(0..=23, rw)]
    fracdiv: u24,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DpllCon3 {
    #[bits(8..=9, rw)]
    work_mode: Option<PllWorkMode>,
    /// Delta-sigma modulator power-down. Set for integer mode.
    #[bit(3, rw)]
    dsmpd: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_mask_gates_low_bits() {
        let val = write_masked(0b101, 0b111);
        assert_eq!(val, 0x0007_0005);
        // Bits outside the mask never make it into the low half.
        let val = write_masked(0xffff, 0x00f0);
        assert_eq!(val, 0x00f0_00f0);
    }

    #[test]
    fn dpll_con_fields() {
        let con0 = DpllCon0::new_with_raw_value(0).with_fbdiv(u12::new(50));
        assert_eq!(con0.raw_value(), 50);
        let mut con1 = DpllCon1::new_with_raw_value(0);
        con1.set_refdiv(u6::new(1));
        con1.set_postdiv1(u3::new(3));
        con1.set_postdiv2(u3::new(1));
        assert_eq!(con1.raw_value(), (1 << 12) | (3 << 8) | 1);
    }
}
