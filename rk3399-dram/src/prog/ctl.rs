//! # Controller (CTL) timing programming
//!
//! The controller duplicates its timing fields once per frequency-set
//! slot. The two copies do not live at a regular stride; each slot's
//! layout is its own fixed address map, reproduced below field for field.
use crate::{
    DramType, TimingRelatedConfig,
    regs::{Field, RegisterBank, field},
    timing::DramTimingSpec,
};

use super::FreqSetSlot;

/// DRAM class codes consumed by the controller.
const CLASS_DDR3: u32 = 0x6;
const CLASS_LPDDR3: u32 = 0x7;
const CLASS_LPDDR4: u32 = 0xB;

/// Slot-independent controller fields.
pub const DRAM_CLASS: Field = field(0, 8, 4);
pub const BURST_LEN: Field = field(1, 16, 5);
pub const AUTO_PRECHARGE: Field = field(1, 24, 1);

/// Per-slot controller timing map.
pub struct CtlTimingFields {
    pub tinit: Field,
    pub tinit3: Field,
    pub tinit4: Field,
    pub tinit5: Field,
    pub trsth: Field,
    pub cl: Field,
    pub cwl: Field,
    pub tcke: Field,
    pub tckesr: Field,
    pub tcksre: Field,
    pub tcksrx: Field,
    pub trcd: Field,
    pub trp: Field,
    pub trppb: Field,
    pub twr: Field,
    pub tdal: Field,
    pub trtp: Field,
    pub trc: Field,
    pub trrd: Field,
    pub tccd: Field,
    pub twtr: Field,
    pub tras_min: Field,
    pub tras_max: Field,
    pub tfaw: Field,
    pub trefi: Field,
    pub trfc: Field,
    pub txsr: Field,
    pub txp: Field,
    pub txpdll: Field,
    pub tdllk: Field,
    pub tmod: Field,
    pub tmrd: Field,
    pub tmrr: Field,
    pub tmrri: Field,
    pub todton: Field,
    pub tdqsck_max: Field,
    pub tzqinit: Field,
    pub tzqcs: Field,
    pub tzqlat: Field,
    pub mr0: Field,
    pub mr1: Field,
    pub mr2: Field,
    pub mr3: Field,
    pub mr11: Field,
    pub mr12: Field,
    pub mr14: Field,
    pub mr22: Field,
}

/// Frequency-set 0 controller map.
pub const CTL_F0: CtlTimingFields = CtlTimingFields {
    tinit: field(5, 0, 24),
    tinit3: field(6, 0, 24),
    tinit4: field(7, 0, 16),
    tinit5: field(7, 16, 16),
    trsth: field(8, 0, 24),
    cl: field(10, 0, 5),
    cwl: field(10, 8, 5),
    tcke: field(11, 0, 8),
    tckesr: field(11, 8, 8),
    tcksre: field(11, 16, 8),
    tcksrx: field(11, 24, 8),
    trcd: field(12, 0, 8),
    trp: field(12, 8, 8),
    trppb: field(12, 16, 8),
    twr: field(12, 24, 8),
    tdal: field(13, 0, 8),
    trtp: field(13, 8, 8),
    trc: field(13, 16, 9),
    trrd: field(14, 0, 8),
    tccd: field(14, 8, 5),
    twtr: field(14, 16, 8),
    tras_min: field(15, 0, 9),
    tras_max: field(15, 9, 17),
    tfaw: field(16, 0, 9),
    trefi: field(17, 0, 16),
    trfc: field(17, 16, 10),
    txsr: field(18, 0, 16),
    txp: field(18, 16, 8),
    txpdll: field(18, 24, 8),
    tdllk: field(19, 0, 16),
    tmod: field(19, 16, 8),
    tmrd: field(19, 24, 8),
    tmrr: field(20, 0, 8),
    tmrri: field(20, 8, 8),
    todton: field(20, 16, 6),
    tdqsck_max: field(20, 24, 4),
    tzqinit: field(21, 0, 12),
    tzqcs: field(21, 12, 12),
    tzqlat: field(21, 24, 8),
    mr0: field(22, 0, 16),
    mr1: field(22, 16, 16),
    mr2: field(23, 0, 16),
    mr3: field(23, 16, 16),
    mr11: field(24, 0, 8),
    mr12: field(24, 8, 8),
    mr14: field(24, 16, 8),
    mr22: field(24, 24, 8),
};

/// Frequency-set 1 controller map. Mostly a block copy at a fixed distance,
/// but the init, latency and mode-register words pack differently.
pub const CTL_F1: CtlTimingFields = CtlTimingFields {
    tinit: field(109, 0, 24),
    tinit3: field(110, 0, 24),
    tinit4: field(111, 0, 16),
    tinit5: field(111, 16, 16),
    trsth: field(112, 0, 24),
    cl: field(114, 16, 5),
    cwl: field(114, 24, 5),
    tcke: field(115, 0, 8),
    tckesr: field(115, 8, 8),
    tcksre: field(115, 16, 8),
    tcksrx: field(115, 24, 8),
    trcd: field(116, 0, 8),
    trp: field(116, 8, 8),
    trppb: field(116, 16, 8),
    twr: field(116, 24, 8),
    tdal: field(117, 0, 8),
    trtp: field(117, 8, 8),
    trc: field(117, 16, 9),
    trrd: field(118, 0, 8),
    tccd: field(118, 8, 5),
    twtr: field(118, 16, 8),
    tras_min: field(119, 0, 9),
    tras_max: field(119, 9, 17),
    tfaw: field(120, 0, 9),
    trefi: field(121, 0, 16),
    trfc: field(121, 16, 10),
    txsr: field(122, 0, 16),
    txp: field(122, 16, 8),
    txpdll: field(122, 24, 8),
    tdllk: field(123, 0, 16),
    tmod: field(123, 16, 8),
    tmrd: field(123, 24, 8),
    tmrr: field(124, 0, 8),
    tmrri: field(124, 8, 8),
    todton: field(124, 16, 6),
    tdqsck_max: field(124, 24, 4),
    tzqinit: field(125, 0, 12),
    tzqcs: field(125, 12, 12),
    tzqlat: field(125, 24, 8),
    mr0: field(126, 16, 16),
    mr1: field(127, 0, 16),
    mr2: field(127, 16, 16),
    mr3: field(128, 0, 16),
    mr11: field(128, 16, 8),
    mr12: field(129, 0, 8),
    mr14: field(129, 8, 8),
    mr22: field(129, 16, 8),
};

pub const fn ctl_fields(slot: FreqSetSlot) -> &'static CtlTimingFields {
    match slot {
        FreqSetSlot::F0 => &CTL_F0,
        FreqSetSlot::F1 => &CTL_F1,
    }
}

/// Program one channel's controller timing for the given slot.
pub fn program(
    bank: &mut RegisterBank,
    spec: &DramTimingSpec,
    config: &TimingRelatedConfig,
    slot: FreqSetSlot,
) {
    let f = ctl_fields(slot);

    let class = match config.dram_type {
        DramType::Ddr3 => CLASS_DDR3,
        DramType::Lpddr4 => CLASS_LPDDR4,
        _ => CLASS_LPDDR3,
    };
    bank.write_field(DRAM_CLASS, class);
    bank.write_field(BURST_LEN, config.burst_len);
    bank.write_field(AUTO_PRECHARGE, config.auto_precharge as u32);

    bank.write_field(f.tinit, spec.tinit1);
    bank.write_field(f.tinit3, spec.tinit3);
    bank.write_field(f.tinit4, spec.tinit4);
    bank.write_field(f.tinit5, spec.tinit5);
    // Reset pin timing exists on DDR3 only; the field is zeroed for the
    // LPDDR types so a previous DDR3 value can never leak in.
    if config.dram_type == DramType::Ddr3 {
        bank.write_field(f.trsth, spec.trsth);
    } else {
        bank.write_field(f.trsth, 0);
    }

    bank.write_field(f.cl, spec.cl);
    bank.write_field(f.cwl, spec.cwl);

    bank.write_field(f.tcke, spec.tcke);
    bank.write_field(f.tckesr, spec.tckesr);
    bank.write_field(f.tcksre, spec.tcksre);
    bank.write_field(f.tcksrx, spec.tcksrx);

    bank.write_field(f.trcd, spec.trcd);
    bank.write_field(f.trp, spec.trp);
    bank.write_field(f.trppb, spec.trppb);
    bank.write_field(f.twr, spec.twr);
    bank.write_field(f.tdal, spec.tdal);
    bank.write_field(f.trtp, spec.trtp);
    bank.write_field(f.trc, spec.trc);
    bank.write_field(f.trrd, spec.trrd);
    bank.write_field(f.tccd, spec.tccd);
    bank.write_field(f.twtr, spec.twtr);
    bank.write_field(f.tras_min, spec.tras_min);
    bank.write_field(f.tras_max, spec.tras_max);
    bank.write_field(f.tfaw, spec.tfaw);
    bank.write_field(f.trefi, spec.trefi);
    bank.write_field(f.trfc, spec.trfc);
    bank.write_field(f.txsr, spec.txsr);
    bank.write_field(f.txp, spec.txp);

    match config.dram_type {
        DramType::Ddr3 => {
            bank.write_field(f.txpdll, spec.txpdll);
            bank.write_field(f.tdllk, spec.tdllk);
            bank.write_field(f.tmod, spec.tmod);
            bank.write_field(f.tdqsck_max, 0);
        }
        DramType::Lpddr4 => {
            bank.write_field(f.txpdll, 0);
            bank.write_field(f.tdllk, 0);
            bank.write_field(f.tmod, 0);
            bank.write_field(f.tdqsck_max, spec.tdqsck_max);
        }
        _ => {
            bank.write_field(f.txpdll, 0);
            bank.write_field(f.tdllk, 0);
            bank.write_field(f.tmod, 0);
            bank.write_field(f.tdqsck_max, spec.tdqsck_max);
        }
    }

    bank.write_field(f.tmrd, spec.tmrd);
    bank.write_field(f.tmrr, spec.tmrr);
    bank.write_field(f.tmrri, spec.tmrri);
    bank.write_field(f.todton, spec.todton);

    bank.write_field(f.tzqinit, spec.tzqinit);
    bank.write_field(f.tzqcs, spec.tzqcs);
    bank.write_field(f.tzqlat, spec.tzqlat);

    bank.write_field(f.mr0, spec.mr[0]);
    bank.write_field(f.mr1, spec.mr[1]);
    bank.write_field(f.mr2, spec.mr[2]);
    bank.write_field(f.mr3, spec.mr[3]);
    if config.dram_type == DramType::Lpddr4 {
        bank.write_field(f.mr11, spec.mr11);
        bank.write_field(f.mr12, spec.mr12);
        bank.write_field(f.mr14, spec.mr14);
        bank.write_field(f.mr22, spec.mr22);
    } else {
        bank.write_field(f.mr11, spec.mr11);
        bank.write_field(f.mr12, 0);
        bank.write_field(f.mr14, 0);
        bank.write_field(f.mr22, 0);
    }
}

/// Every per-slot field of one map, for audits and slot-isolation checks.
pub fn all_fields(slot: FreqSetSlot) -> [Field; 47] {
    let f = ctl_fields(slot);
    [
        f.tinit, f.tinit3, f.tinit4, f.tinit5, f.trsth, f.cl, f.cwl, f.tcke, f.tckesr, f.tcksre,
        f.tcksrx, f.trcd, f.trp, f.trppb, f.twr, f.tdal, f.trtp, f.trc, f.trrd, f.tccd, f.twtr,
        f.tras_min, f.tras_max, f.tfaw, f.trefi, f.trfc, f.txsr, f.txp, f.txpdll, f.tdllk, f.tmod,
        f.tmrd, f.tmrr, f.tmrri, f.todton, f.tdqsck_max, f.tzqinit, f.tzqcs, f.tzqlat, f.mr0,
        f.mr1, f.mr2, f.mr3, f.mr11, f.mr12, f.mr14, f.mr22,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{dram_get_parameter, tests_support::default_config};
    use rk3399::ddr;

    fn bank(mem: &mut [u32; ddr::CTL_REG_COUNT]) -> RegisterBank {
        // Safety: bank over a local buffer.
        unsafe { RegisterBank::new(mem.as_mut_ptr(), ddr::CTL_REG_COUNT) }
    }

    #[test]
    fn f0_and_f1_maps_are_disjoint() {
        for a in all_fields(FreqSetSlot::F0) {
            for b in all_fields(FreqSetSlot::F1) {
                assert!(
                    a.reg != b.reg || (a.mask() & b.mask()) == 0,
                    "overlap between F0 {a:?} and F1 {b:?}"
                );
            }
        }
    }

    #[test]
    fn golden_descriptors() {
        // Spot checks pinning the fixed address map.
        assert_eq!(CTL_F0.tinit, field(5, 0, 24));
        assert_eq!(CTL_F0.trefi, field(17, 0, 16));
        assert_eq!(CTL_F0.mr0, field(22, 0, 16));
        assert_eq!(CTL_F1.tinit, field(109, 0, 24));
        assert_eq!(CTL_F1.cl, field(114, 16, 5));
        assert_eq!(CTL_F1.mr0, field(126, 16, 16));
    }

    #[test]
    fn programming_f1_leaves_f0_words_untouched() {
        let mut mem = [0u32; ddr::CTL_REG_COUNT];
        let config = default_config(crate::DramType::Lpddr4);
        let spec = dram_get_parameter(&config, 400);
        {
            let mut b = bank(&mut mem);
            program(&mut b, &spec, &config, FreqSetSlot::F0);
        }
        let f0_snapshot = mem;
        {
            let mut b = bank(&mut mem);
            let spec1 = dram_get_parameter(&config, 800);
            program(&mut b, &spec1, &config, FreqSetSlot::F1);
        }
        for f in all_fields(FreqSetSlot::F0) {
            assert_eq!(
                mem[f.reg as usize] & f.mask(),
                f0_snapshot[f.reg as usize] & f.mask(),
                "F0 field {f:?} disturbed by F1 programming"
            );
        }
    }

    #[test]
    fn timing_fields_land_in_map() {
        let mut mem = [0u32; ddr::CTL_REG_COUNT];
        let config = default_config(crate::DramType::Ddr3);
        let spec = dram_get_parameter(&config, 666);
        let mut b = bank(&mut mem);
        program(&mut b, &spec, &config, FreqSetSlot::F0);
        assert_eq!(b.read_field(CTL_F0.cl), spec.cl);
        assert_eq!(b.read_field(CTL_F0.trefi), spec.trefi);
        assert_eq!(b.read_field(CTL_F0.mr0), spec.mr[0]);
        assert_eq!(b.read_field(DRAM_CLASS), 0x6);
        // DDR3 keeps its DLL fields, LPDDR zeroes them.
        assert_eq!(b.read_field(CTL_F0.tdllk), spec.tdllk);
    }
}
