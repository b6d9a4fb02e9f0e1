//! # PHY programming and DLL bypass
//!
//! The PHY is organized as four data slices at a fixed stride plus a
//! global control block. Below the bypass threshold the slice DLLs cannot
//! lock, so the write-DQS slave delays are forced to zero and the master
//! delay lines are put into software bypass. The live delay values are
//! saved per `(channel, slot)` before being zeroed and restored when that
//! slot later leaves bypass; getting this save/restore pairing wrong shows
//! up only as data corruption several frequency changes later.
use crate::{
    DrvOdtLpConfig, TimingRelatedConfig,
    regs::{Field, RegisterBank, field},
    timing::DramTimingSpec,
};

use super::FreqSetSlot;

/// Frequencies strictly below this use DLL bypass.
pub const DLL_BYPASS_THRESHOLD_MHZ: u32 = 300;

/// Number of data slices.
pub const LANE_COUNT: usize = 4;
/// Register stride between data slices.
const LANE_STRIDE: u16 = 128;

/// First word of the global control block.
const GLOBAL_BASE: u16 = 896;

/// Global pad/drive fields, slot-independent.
pub const DQ_TSEL_DRV: Field = field(GLOBAL_BASE + 17, 0, 8);
pub const CA_TSEL_DRV: Field = field(GLOBAL_BASE + 18, 0, 8);
pub const DQ_TSEL_ODT: Field = field(GLOBAL_BASE + 19, 0, 8);
pub const PAD_VREF: Field = field(GLOBAL_BASE + 20, 0, 8);
/// Master ODT drive control, toggled around retraining.
pub const ODT_DRIVE_EN: Field = field(GLOBAL_BASE + 21, 0, 1);
/// Per-slot DLL bypass mode bits.
pub const BYPASS_MODE_F0: Field = field(GLOBAL_BASE + 22, 0, 1);
pub const BYPASS_MODE_F1: Field = field(GLOBAL_BASE + 22, 8, 1);

/// Write-DQS slave delay for one lane and slot.
pub const fn wrdqs_slave_delay(lane: usize, slot: FreqSetSlot) -> Field {
    let base = 8 + LANE_STRIDE * lane as u16;
    match slot {
        FreqSetSlot::F0 => field(base, 0, 10),
        FreqSetSlot::F1 => field(base, 16, 10),
    }
}

/// Software master-mode (bypass) control for one lane and slot.
pub const fn sw_master_mode(lane: usize, slot: FreqSetSlot) -> Field {
    let base = 10 + LANE_STRIDE * lane as u16;
    match slot {
        FreqSetSlot::F0 => field(base, 0, 4),
        FreqSetSlot::F1 => field(base, 16, 4),
    }
}

const MASTER_MODE_NORMAL: u32 = 0x0;
const MASTER_MODE_BYPASS: u32 = 0xC;

/// PHY-side drive/termination strength code.
fn tsel_code(ohm: u32) -> u32 {
    match ohm {
        240 => 0x1,
        120 => 0x2,
        80 => 0x3,
        60 => 0x4,
        48 => 0x5,
        40 => 0x6,
        34 => 0x7,
        _ => 0x6,
    }
}

/// Saved write-DQS delays, keyed by `(channel, slot)`.
///
/// `None` means that slot is not currently in bypass on that channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct DllBypassCache {
    saved: [[Option<[u32; LANE_COUNT]>; 2]; 2],
}

/// Program the slot-independent PHY pad configuration.
pub fn program(
    bank: &mut RegisterBank,
    _spec: &DramTimingSpec,
    config: &TimingRelatedConfig,
    drv: &DrvOdtLpConfig,
) {
    bank.write_field(DQ_TSEL_DRV, tsel_code(drv.phy_dq_drv_ohm));
    bank.write_field(CA_TSEL_DRV, tsel_code(drv.phy_ca_drv_ohm));
    bank.write_field(DQ_TSEL_ODT, tsel_code(drv.phy_odt_ohm));
    // Mid-rail reference unless DBI shifts the eye.
    let vref = if config.read_dbi { 0x60 } else { 0x80 };
    bank.write_field(PAD_VREF, vref);
}

/// Enter or leave DLL bypass for one channel/slot, saving or restoring the
/// write-DQS slave delays as needed.
pub fn dll_bypass(
    bank: &mut RegisterBank,
    channel: usize,
    slot: FreqSetSlot,
    mhz: u32,
    cache: &mut DllBypassCache,
) {
    let slot_idx = slot.index();
    let mode_field = match slot {
        FreqSetSlot::F0 => BYPASS_MODE_F0,
        FreqSetSlot::F1 => BYPASS_MODE_F1,
    };

    if mhz < DLL_BYPASS_THRESHOLD_MHZ {
        if cache.saved[channel][slot_idx].is_none() {
            // First entry for this slot: the live delays are about to be
            // zeroed, keep them for the return above threshold.
            let mut delays = [0u32; LANE_COUNT];
            for (lane, d) in delays.iter_mut().enumerate() {
                *d = bank.read_field(wrdqs_slave_delay(lane, slot));
            }
            cache.saved[channel][slot_idx] = Some(delays);
        }
        for lane in 0..LANE_COUNT {
            bank.write_field(wrdqs_slave_delay(lane, slot), 0);
            bank.write_field(sw_master_mode(lane, slot), MASTER_MODE_BYPASS);
        }
        bank.write_field(mode_field, 1);
    } else {
        if let Some(delays) = cache.saved[channel][slot_idx].take() {
            for (lane, d) in delays.iter().enumerate() {
                bank.write_field(wrdqs_slave_delay(lane, slot), *d);
            }
        }
        for lane in 0..LANE_COUNT {
            bank.write_field(sw_master_mode(lane, slot), MASTER_MODE_NORMAL);
        }
        bank.write_field(mode_field, 0);
    }
}

/// Drive or release the PHY-side ODT.
pub fn set_odt_drive(bank: &mut RegisterBank, enable: bool) {
    bank.write_field(ODT_DRIVE_EN, enable as u32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk3399::ddr;

    fn bank(mem: &mut [u32; ddr::PHY_REG_COUNT]) -> RegisterBank {
        // Safety: bank over a local buffer.
        unsafe { RegisterBank::new(mem.as_mut_ptr(), ddr::PHY_REG_COUNT) }
    }

    #[test]
    fn bypass_saves_and_restores_delays() {
        let mut mem = [0u32; ddr::PHY_REG_COUNT];
        let mut b = bank(&mut mem);
        let mut cache = DllBypassCache::default();
        let original = [0x11, 0x22, 0x33, 0x44];
        for (lane, d) in original.iter().enumerate() {
            b.write_field(wrdqs_slave_delay(lane, FreqSetSlot::F1), *d);
        }

        dll_bypass(&mut b, 0, FreqSetSlot::F1, 200, &mut cache);
        for lane in 0..LANE_COUNT {
            assert_eq!(b.read_field(wrdqs_slave_delay(lane, FreqSetSlot::F1)), 0);
            assert_eq!(
                b.read_field(sw_master_mode(lane, FreqSetSlot::F1)),
                MASTER_MODE_BYPASS
            );
        }
        assert_eq!(b.read_field(BYPASS_MODE_F1), 1);

        dll_bypass(&mut b, 0, FreqSetSlot::F1, 800, &mut cache);
        for (lane, d) in original.iter().enumerate() {
            assert_eq!(b.read_field(wrdqs_slave_delay(lane, FreqSetSlot::F1)), *d);
        }
        assert_eq!(b.read_field(BYPASS_MODE_F1), 0);
        assert!(cache.saved[0][1].is_none());
    }

    #[test]
    fn repeated_bypass_entry_keeps_first_save() {
        // Entering bypass twice in a row (both slots reprogrammed low) must
        // not overwrite the saved delays with the zeroed values.
        let mut mem = [0u32; ddr::PHY_REG_COUNT];
        let mut b = bank(&mut mem);
        let mut cache = DllBypassCache::default();
        b.write_field(wrdqs_slave_delay(2, FreqSetSlot::F0), 0x5A);

        dll_bypass(&mut b, 1, FreqSetSlot::F0, 200, &mut cache);
        dll_bypass(&mut b, 1, FreqSetSlot::F0, 200, &mut cache);
        dll_bypass(&mut b, 1, FreqSetSlot::F0, 400, &mut cache);
        assert_eq!(b.read_field(wrdqs_slave_delay(2, FreqSetSlot::F0)), 0x5A);
    }

    #[test]
    fn per_slot_saves_are_independent() {
        let mut mem = [0u32; ddr::PHY_REG_COUNT];
        let mut b = bank(&mut mem);
        let mut cache = DllBypassCache::default();
        b.write_field(wrdqs_slave_delay(0, FreqSetSlot::F0), 0xA0);
        b.write_field(wrdqs_slave_delay(0, FreqSetSlot::F1), 0xB0);

        dll_bypass(&mut b, 0, FreqSetSlot::F0, 200, &mut cache);
        dll_bypass(&mut b, 0, FreqSetSlot::F1, 200, &mut cache);
        dll_bypass(&mut b, 0, FreqSetSlot::F1, 600, &mut cache);
        dll_bypass(&mut b, 0, FreqSetSlot::F0, 600, &mut cache);

        assert_eq!(b.read_field(wrdqs_slave_delay(0, FreqSetSlot::F0)), 0xA0);
        assert_eq!(b.read_field(wrdqs_slave_delay(0, FreqSetSlot::F1)), 0xB0);
    }

    #[test]
    fn threshold_is_strict() {
        // 300 MHz itself runs the DLLs; only frequencies below bypass them.
        let mut mem = [0u32; ddr::PHY_REG_COUNT];
        let mut b = bank(&mut mem);
        let mut cache = DllBypassCache::default();
        dll_bypass(&mut b, 0, FreqSetSlot::F0, 300, &mut cache);
        assert_eq!(b.read_field(BYPASS_MODE_F0), 0);
        dll_bypass(&mut b, 0, FreqSetSlot::F0, 299, &mut cache);
        assert_eq!(b.read_field(BYPASS_MODE_F0), 1);
    }
}
