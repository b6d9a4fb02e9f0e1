//! # PHY-interface (PI) programming
//!
//! The PI shim translates controller commands into PHY timing. Its
//! latency fields are not raw JEDEC values: they are adjusted by the
//! input-enable and termination windows derived in [crate::timing]. The PI
//! also owns the training state machines, which the orchestrator gates
//! around the frequency switch.
use crate::{
    DramType, TimingRelatedConfig,
    regs::{Field, RegisterBank, field},
    timing::{
        DramTimingSpec, get_pi_rdlat_adj, get_pi_tdfi_phy_rdlat, get_pi_todtoff_max,
        get_pi_todtoff_min, get_pi_wrlat_adj,
    },
};

use super::FreqSetSlot;

/// Slot-independent training enables: write leveling, read-gate training,
/// CA training. Each holds a 2-bit per-rank enable group.
pub const WRLVL_EN: Field = field(60, 8, 2);
pub const RDLVL_GATE_EN: Field = field(61, 16, 2);
pub const CALVL_EN: Field = field(62, 24, 2);

/// Per-slot PI timing map.
pub struct PiTimingFields {
    pub cl: Field,
    pub cwl: Field,
    pub rdlat_adj: Field,
    pub wrlat_adj: Field,
    pub tdfi_phy_rdlat: Field,
    pub todtoff_min: Field,
    pub todtoff_max: Field,
    pub trcd: Field,
    pub trp: Field,
    pub trtp: Field,
    pub twtr: Field,
    pub trrd: Field,
    pub tccd: Field,
    pub tras_min: Field,
    pub tfaw: Field,
    pub trefi: Field,
    pub trfc: Field,
    pub txp: Field,
    pub txsr: Field,
    pub tcke: Field,
    pub tckesr: Field,
    pub tdqsck_max: Field,
    pub tmrd: Field,
    pub tmrr: Field,
    pub tdllk: Field,
    pub tzqlat: Field,
}

pub const PI_F0: PiTimingFields = PiTimingFields {
    cl: field(10, 0, 5),
    cwl: field(10, 8, 5),
    rdlat_adj: field(11, 0, 8),
    wrlat_adj: field(11, 8, 8),
    tdfi_phy_rdlat: field(11, 16, 8),
    todtoff_min: field(12, 0, 6),
    todtoff_max: field(12, 8, 6),
    trcd: field(13, 0, 8),
    trp: field(13, 8, 8),
    trtp: field(13, 16, 8),
    twtr: field(13, 24, 8),
    trrd: field(14, 0, 8),
    tccd: field(14, 8, 5),
    tras_min: field(14, 16, 9),
    tfaw: field(15, 0, 9),
    trefi: field(16, 0, 16),
    trfc: field(16, 16, 10),
    txp: field(17, 0, 8),
    txsr: field(17, 8, 16),
    tcke: field(18, 0, 8),
    tckesr: field(18, 8, 8),
    tdqsck_max: field(18, 16, 4),
    tmrd: field(19, 0, 8),
    tmrr: field(19, 8, 8),
    tdllk: field(20, 0, 16),
    tzqlat: field(20, 16, 8),
};

/// The F1 copy interleaves with other per-slot machinery, so its stride
/// from F0 is not uniform.
pub const PI_F1: PiTimingFields = PiTimingFields {
    cl: field(90, 16, 5),
    cwl: field(90, 24, 5),
    rdlat_adj: field(91, 0, 8),
    wrlat_adj: field(91, 8, 8),
    tdfi_phy_rdlat: field(91, 16, 8),
    todtoff_min: field(92, 16, 6),
    todtoff_max: field(92, 24, 6),
    trcd: field(93, 0, 8),
    trp: field(93, 8, 8),
    trtp: field(93, 16, 8),
    twtr: field(93, 24, 8),
    trrd: field(94, 0, 8),
    tccd: field(94, 8, 5),
    tras_min: field(94, 16, 9),
    tfaw: field(95, 0, 9),
    trefi: field(96, 0, 16),
    trfc: field(96, 16, 10),
    txp: field(97, 0, 8),
    txsr: field(97, 8, 16),
    tcke: field(98, 0, 8),
    tckesr: field(98, 8, 8),
    tdqsck_max: field(98, 16, 4),
    tmrd: field(99, 0, 8),
    tmrr: field(99, 8, 8),
    tdllk: field(100, 0, 16),
    tzqlat: field(100, 16, 8),
};

pub const fn pi_fields(slot: FreqSetSlot) -> &'static PiTimingFields {
    match slot {
        FreqSetSlot::F0 => &PI_F0,
        FreqSetSlot::F1 => &PI_F1,
    }
}

/// Program one channel's PI timing for the given slot.
pub fn program(
    bank: &mut RegisterBank,
    spec: &DramTimingSpec,
    config: &TimingRelatedConfig,
    slot: FreqSetSlot,
) {
    let f = pi_fields(slot);

    bank.write_field(f.cl, spec.cl);
    bank.write_field(f.cwl, spec.cwl);
    // The adjusted latencies; an off-table CAS latency propagates the 0xFF
    // sentinel into these fields unchecked.
    bank.write_field(f.rdlat_adj, get_pi_rdlat_adj(spec));
    bank.write_field(f.wrlat_adj, get_pi_wrlat_adj(config.dram_type, spec));
    bank.write_field(f.tdfi_phy_rdlat, get_pi_tdfi_phy_rdlat(spec));
    bank.write_field(
        f.todtoff_min,
        get_pi_todtoff_min(config.dram_type, spec.mhz),
    );
    bank.write_field(
        f.todtoff_max,
        get_pi_todtoff_max(config.dram_type, spec.mhz),
    );

    bank.write_field(f.trcd, spec.trcd);
    bank.write_field(f.trp, spec.trp);
    bank.write_field(f.trtp, spec.trtp);
    bank.write_field(f.twtr, spec.twtr);
    bank.write_field(f.trrd, spec.trrd);
    bank.write_field(f.tccd, spec.tccd);
    bank.write_field(f.tras_min, spec.tras_min);
    bank.write_field(f.tfaw, spec.tfaw);
    bank.write_field(f.trefi, spec.trefi);
    bank.write_field(f.trfc, spec.trfc);
    bank.write_field(f.txp, spec.txp);
    bank.write_field(f.txsr, spec.txsr);
    bank.write_field(f.tcke, spec.tcke);
    bank.write_field(f.tckesr, spec.tckesr);
    bank.write_field(f.tmrd, spec.tmrd);
    bank.write_field(f.tmrr, spec.tmrr);

    match config.dram_type {
        DramType::Ddr3 => {
            bank.write_field(f.tdllk, spec.tdllk);
            bank.write_field(f.tdqsck_max, 0);
            bank.write_field(f.tzqlat, 0);
        }
        DramType::Lpddr4 => {
            bank.write_field(f.tdllk, 0);
            bank.write_field(f.tdqsck_max, spec.tdqsck_max);
            bank.write_field(f.tzqlat, spec.tzqlat);
        }
        _ => {
            bank.write_field(f.tdllk, 0);
            bank.write_field(f.tdqsck_max, spec.tdqsck_max);
            bank.write_field(f.tzqlat, 0);
        }
    }
}

/// Arm the PI training machines for the upcoming switch. CA training only
/// exists on the LPDDR types.
pub fn enable_training(bank: &mut RegisterBank, dram_type: DramType) {
    bank.write_field(WRLVL_EN, 0x3);
    bank.write_field(RDLVL_GATE_EN, 0x3);
    match dram_type {
        DramType::Ddr3 => bank.write_field(CALVL_EN, 0x0),
        _ => bank.write_field(CALVL_EN, 0x3),
    }
}

/// Disarm all training machines. Runs on every switch exit path.
pub fn disable_training(bank: &mut RegisterBank) {
    bank.write_field(WRLVL_EN, 0x0);
    bank.write_field(RDLVL_GATE_EN, 0x0);
    bank.write_field(CALVL_EN, 0x0);
}

/// Every per-slot field of one map.
pub fn all_fields(slot: FreqSetSlot) -> [Field; 26] {
    let f = pi_fields(slot);
    [
        f.cl,
        f.cwl,
        f.rdlat_adj,
        f.wrlat_adj,
        f.tdfi_phy_rdlat,
        f.todtoff_min,
        f.todtoff_max,
        f.trcd,
        f.trp,
        f.trtp,
        f.twtr,
        f.trrd,
        f.tccd,
        f.tras_min,
        f.tfaw,
        f.trefi,
        f.trfc,
        f.txp,
        f.txsr,
        f.tcke,
        f.tckesr,
        f.tdqsck_max,
        f.tmrd,
        f.tmrr,
        f.tdllk,
        f.tzqlat,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{dram_get_parameter, tests_support::default_config};
    use rk3399::ddr;

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
    fn adjusted_latencies_are_programmed() {
        let mut mem = [0u32; ddr::PI_REG_COUNT];
        // Safety: bank over a local buffer.
        let mut bank = unsafe { RegisterBank::new(mem.as_mut_ptr(), ddr::PI_REG_COUNT) };
        let config = default_config(crate::DramType::Lpddr3);
        let spec = dram_get_parameter(&config, 600);
        program(&mut bank, &spec, &config, FreqSetSlot::F1);
        assert_eq!(bank.read_field(PI_F1.rdlat_adj), get_pi_rdlat_adj(&spec));
        assert_eq!(
            bank.read_field(PI_F1.wrlat_adj),
            get_pi_wrlat_adj(crate::DramType::Lpddr3, &spec)
        );
        assert!(bank.read_field(PI_F1.todtoff_min) > 0);
    }

    #[test]
    fn training_gate_round_trip() {
        let mut mem = [0u32; ddr::PI_REG_COUNT];
        let mut bank = unsafe { RegisterBank::new(mem.as_mut_ptr(), ddr::PI_REG_COUNT) };
        enable_training(&mut bank, crate::DramType::Lpddr4);
        assert_eq!(bank.read_field(WRLVL_EN), 0x3);
        assert_eq!(bank.read_field(CALVL_EN), 0x3);
        disable_training(&mut bank);
        assert_eq!(bank.read_field(WRLVL_EN), 0);
        assert_eq!(bank.read_field(RDLVL_GATE_EN), 0);
        assert_eq!(bank.read_field(CALVL_EN), 0);
    }
}
