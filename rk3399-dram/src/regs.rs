//! # Descriptor-driven register access
//!
//! The three timing banks pack hundreds of independent sub-fields into
//! dense 32-bit words, and most fields exist once per frequency-set slot at
//! unrelated addresses. Instead of inline shift/mask literals, every field
//! is a named [Field] descriptor (word index, bit offset, width) and all
//! writes funnel through one masked read-modify-write primitive, so a write
//! to a field can never disturb neighbouring bits of the same word.
use rk3399::{cic, cru, ddr, pmu};

/// A named bit field inside a register bank: word index, lsb, width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub reg: u16,
    pub lsb: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(reg: u16, lsb: u8, width: u8) -> Self {
        assert!(width >= 1 && width <= 32);
        assert!(lsb as u32 + width as u32 <= 32);
        Self { reg, lsb, width }
    }

    /// In-word mask covering exactly this field.
    pub const fn mask(&self) -> u32 {
        if self.width == 32 {
            u32::MAX
        } else {
            ((1u32 << self.width) - 1) << self.lsb
        }
    }

    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u32 {
        self.mask() >> self.lsb
    }
}

/// Shorthand used by the descriptor tables.
pub const fn field(reg: u16, lsb: u8, width: u8) -> Field {
    Field::new(reg, lsb, width)
}

/// A bank of consecutive 32-bit hardware registers.
///
/// All access is volatile. In firmware a bank wraps an MMIO window; tests
/// construct banks over plain word buffers.
#[derive(Debug)]
pub struct RegisterBank {
    base: *mut u32,
    len: usize,
}

impl RegisterBank {
    /// Wrap `len` words starting at `base`.
    ///
    /// # Safety
    ///
    /// `base..base + len` must stay valid and uniquely writable through
    /// this bank for its whole lifetime.
    pub const unsafe fn new(base: *mut u32, len: usize) -> Self {
        Self { base, len }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn read(&self, reg: usize) -> u32 {
        assert!(reg < self.len);
        // Safety: index checked above, validity guaranteed by constructor.
        unsafe { self.base.add(reg).read_volatile() }
    }

    #[inline]
    pub fn write(&mut self, reg: usize, value: u32) {
        assert!(reg < self.len);
        // Safety: index checked above, validity guaranteed by constructor.
        unsafe { self.base.add(reg).write_volatile(value) }
    }

    /// Read-modify-write of `reg` through `f`.
    #[inline]
    pub fn modify(&mut self, reg: usize, f: impl FnOnce(u32) -> u32) {
        let val = self.read(reg);
        self.write(reg, f(val));
    }

    /// Extract a field value.
    #[inline]
    pub fn read_field(&self, f: Field) -> u32 {
        (self.read(f.reg as usize) & f.mask()) >> f.lsb
    }

    /// Masked read-modify-write of one field. Bits outside the field are
    /// preserved bit-for-bit; a `value` wider than the field is truncated
    /// to it.
    #[inline]
    pub fn write_field(&mut self, f: Field, value: u32) {
        debug_assert!(value <= f.max_value(), "field value out of range");
        let old = self.read(f.reg as usize);
        let new = (old & !f.mask()) | ((value << f.lsb) & f.mask());
        self.write(f.reg as usize, new);
    }

    #[inline]
    pub fn set_bits(&mut self, reg: usize, bits: u32) {
        self.modify(reg, |v| v | bits);
    }

    #[inline]
    pub fn clear_bits(&mut self, reg: usize, bits: u32) {
        self.modify(reg, |v| v & !bits);
    }
}

/// The register windows the engine owns: per-channel CTL/PI/PHY banks, the
/// DPLL control slice, the PMU soft-control word and the CIC control words.
///
/// The M0 handoff block keeps its own handles (see [crate::mcu]); the
/// single-threaded secure-world calling convention excludes concurrent
/// access.
#[derive(Debug)]
pub struct DramRegs {
    pub ctl: [RegisterBank; 2],
    pub pi: [RegisterBank; 2],
    pub phy: [RegisterBank; 2],
    pub cru_dpll: RegisterBank,
    pub pmu: RegisterBank,
    pub cic: RegisterBank,
}

/// Word index of `PMU_SFT_CON` within the [DramRegs::pmu] bank.
pub const PMU_SFT_CON: usize = pmu::PMU_SFT_CON_OFFSET / 4;
/// Number of PMU words the engine maps.
pub const PMU_BANK_LEN: usize = 16;

/// Word indices within the [DramRegs::cic] bank.
pub const CIC_CTRL0: usize = 0;
pub const CIC_CTRL1: usize = 1;
pub const CIC_STATUS0: usize = 4;
pub const CIC_BANK_LEN: usize = 5;

impl DramRegs {
    /// Map the fixed RK3399 register windows.
    ///
    /// # Safety
    ///
    /// Must only be constructed once per firmware lifetime, and only in the
    /// secure world where these windows are mapped.
    pub unsafe fn new_fixed() -> Self {
        // Safety: fixed SoC windows, exclusivity delegated to the caller.
        unsafe {
            Self {
                ctl: [
                    RegisterBank::new(ddr::ctl_base(0) as *mut u32, ddr::CTL_REG_COUNT),
                    RegisterBank::new(ddr::ctl_base(1) as *mut u32, ddr::CTL_REG_COUNT),
                ],
                pi: [
                    RegisterBank::new(ddr::pi_base(0) as *mut u32, ddr::PI_REG_COUNT),
                    RegisterBank::new(ddr::pi_base(1) as *mut u32, ddr::PI_REG_COUNT),
                ],
                phy: [
                    RegisterBank::new(ddr::phy_base(0) as *mut u32, ddr::PHY_REG_COUNT),
                    RegisterBank::new(ddr::phy_base(1) as *mut u32, ddr::PHY_REG_COUNT),
                ],
                cru_dpll: RegisterBank::new(
                    (cru::CRU_BASE_ADDR + cru::DPLL_CON_OFFSET) as *mut u32,
                    cru::DPLL_CON_COUNT,
                ),
                pmu: RegisterBank::new(pmu::PMU_BASE_ADDR as *mut u32, PMU_BANK_LEN),
                cic: RegisterBank::new(cic::CIC_BASE_ADDR as *mut u32, CIC_BANK_LEN),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Buffer-backed banks for host tests.
    use super::*;
    use rk3399::ddr;

    /// Backing storage for a full [DramRegs] set.
    pub struct FakeDram {
        pub ctl: [[u32; ddr::CTL_REG_COUNT]; 2],
        pub pi: [[u32; ddr::PI_REG_COUNT]; 2],
        pub phy: [[u32; ddr::PHY_REG_COUNT]; 2],
        pub cru_dpll: [u32; cru::DPLL_CON_COUNT],
        pub pmu: [u32; PMU_BANK_LEN],
        pub cic: [u32; CIC_BANK_LEN],
    }

    impl FakeDram {
        pub fn new() -> Self {
            Self {
                ctl: [[0; ddr::CTL_REG_COUNT]; 2],
                pi: [[0; ddr::PI_REG_COUNT]; 2],
                phy: [[0; ddr::PHY_REG_COUNT]; 2],
                cru_dpll: [0; cru::DPLL_CON_COUNT],
                pmu: [0; PMU_BANK_LEN],
                cic: [0; CIC_BANK_LEN],
            }
        }

        /// Banks over this storage. The storage must outlive the returned
        /// [DramRegs].
        pub fn regs(&mut self) -> DramRegs {
            // Safety: buffers live as long as self, tests keep self alive.
            unsafe {
                DramRegs {
                    ctl: [
                        RegisterBank::new(self.ctl[0].as_mut_ptr(), ddr::CTL_REG_COUNT),
                        RegisterBank::new(self.ctl[1].as_mut_ptr(), ddr::CTL_REG_COUNT),
                    ],
                    pi: [
                        RegisterBank::new(self.pi[0].as_mut_ptr(), ddr::PI_REG_COUNT),
                        RegisterBank::new(self.pi[1].as_mut_ptr(), ddr::PI_REG_COUNT),
                    ],
                    phy: [
                        RegisterBank::new(self.phy[0].as_mut_ptr(), ddr::PHY_REG_COUNT),
                        RegisterBank::new(self.phy[1].as_mut_ptr(), ddr::PHY_REG_COUNT),
                    ],
                    cru_dpll: RegisterBank::new(
                        self.cru_dpll.as_mut_ptr(),
                        cru::DPLL_CON_COUNT,
                    ),
                    pmu: RegisterBank::new(self.pmu.as_mut_ptr(), PMU_BANK_LEN),
                    cic: RegisterBank::new(self.cic.as_mut_ptr(), CIC_BANK_LEN),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_mask() {
        let f = field(10, 8, 4);
        assert_eq!(f.mask(), 0x0000_0F00);
        assert_eq!(f.max_value(), 0xF);
        assert_eq!(field(0, 0, 32).mask(), u32::MAX);
    }

    #[test]
    fn masked_rmw_preserves_neighbours() {
        let mut mem = [0u32; 4];
        mem[2] = 0xDEAD_BEEF;
        // Safety: bank over a local buffer.
        let mut bank = unsafe { RegisterBank::new(mem.as_mut_ptr(), 4) };
        let f = field(2, 8, 8);
        bank.write_field(f, 0x42);
        assert_eq!(bank.read_field(f), 0x42);
        // Everything outside [8, 16) is untouched.
        assert_eq!(bank.read(2) & !f.mask(), 0xDEAD_BEEF & !f.mask());
        assert_eq!(bank.read(2), 0xDEAD_42EF);
    }

    #[test]
    fn wide_value_is_confined_to_field() {
        let mut mem = [0u32; 1];
        let mut bank = unsafe { RegisterBank::new(mem.as_mut_ptr(), 1) };
        let f = field(0, 4, 4);
        // debug_assert guards this in debug builds; the masked write still
        // cannot clobber neighbours.
        let new = (bank.read(0) & !f.mask()) | ((0x1F << f.lsb) & f.mask());
        bank.write(0, new);
        assert_eq!(bank.read(0), 0x0000_00F0);
    }
}
