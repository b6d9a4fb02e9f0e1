//! # Drive-strength and termination decode
//!
//! The controller mirrors the DRAM mode registers into shadow words after
//! init and training. This module decodes the MR1/MR3/MR11 images into
//! ohm-valued drive and termination settings, and re-encodes the defaults
//! when the timing derivation rebuilds mode-register payloads. Unrecognized
//! codes decode to a safe default rather than failing; a wrong value here
//! degrades margin, it does not stop the machine.
use rk3399::ddr;

use crate::{DramType, DrvOdtLpConfig, TimingRelatedConfig, regs::RegisterBank};

/// Default DRAM-side output drive when a code is unrecognized, ohms.
pub const DEFAULT_DRAM_DRV_OHM: u32 = 40;
/// PHY-side defaults, ohms.
pub const DEFAULT_PHY_DQ_DRV_OHM: u32 = 40;
pub const DEFAULT_PHY_CA_DRV_OHM: u32 = 40;
pub const DEFAULT_PHY_ODT_OHM: u32 = 240;

/// DDR3 MR1 output driver impedance (A5, A1).
fn ddr3_dic_ohm(code: u32) -> u32 {
    match code {
        0b00 => 40,
        0b01 => 34,
        _ => DEFAULT_DRAM_DRV_OHM,
    }
}

/// DDR3 MR1 Rtt_nom (A9, A6, A2). Zero means termination disabled.
fn ddr3_rtt_nom_ohm(code: u32) -> u32 {
    match code {
        0b001 => 60,
        0b010 => 120,
        0b011 => 40,
        0b100 => 20,
        0b101 => 30,
        _ => 0,
    }
}

/// LPDDR3 MR3 pull-down/pull-up drive strength.
fn lpddr3_ds_ohm(code: u32) -> u32 {
    match code {
        0x1 => 34,
        0x2 => 40,
        0x3 => 48,
        0x4 => 60,
        0x6 => 80,
        _ => DEFAULT_DRAM_DRV_OHM,
    }
}

/// LPDDR3 MR11 DQ ODT. Zero means disabled.
fn lpddr3_odt_ohm(code: u32) -> u32 {
    match code {
        0x1 => 60,
        0x2 => 120,
        0x3 => 240,
        _ => 0,
    }
}

/// LPDDR4 MR3 pull-down drive strength.
fn lpddr4_pdds_ohm(code: u32) -> u32 {
    match code {
        0x1 => 240,
        0x2 => 120,
        0x3 => 80,
        0x4 => 60,
        0x5 => 48,
        0x6 => 40,
        _ => DEFAULT_DRAM_DRV_OHM,
    }
}

/// LPDDR4 termination code used by MR11 (DQ and CA) and MR22 (SoC side).
fn lpddr4_odt_ohm(code: u32) -> u32 {
    match code {
        0x1 => 240,
        0x2 => 120,
        0x3 => 80,
        0x4 => 60,
        0x5 => 48,
        0x6 => 40,
        _ => 0,
    }
}

/// Decode the controller's mode-register shadows into electrical settings.
///
/// Pure decode: the only hardware interaction is the shadow read.
pub fn get_dram_drv_odt_val(dram_type: DramType, ctl: &RegisterBank) -> DrvOdtLpConfig {
    let mr1 = ctl.read(ddr::CTL_MR1_SHADOW);
    let mr3 = ctl.read(ddr::CTL_MR3_SHADOW);
    let mr11 = ctl.read(ddr::CTL_MR11_SHADOW);

    let mut cfg = DrvOdtLpConfig {
        phy_dq_drv_ohm: DEFAULT_PHY_DQ_DRV_OHM,
        phy_ca_drv_ohm: DEFAULT_PHY_CA_DRV_OHM,
        phy_odt_ohm: DEFAULT_PHY_ODT_OHM,
        ..Default::default()
    };
    match dram_type {
        DramType::Ddr3 => {
            let dic = ((mr1 >> 5) & 0x1) << 1 | ((mr1 >> 1) & 0x1);
            let rtt = ((mr1 >> 9) & 0x1) << 2 | ((mr1 >> 6) & 0x1) << 1 | ((mr1 >> 2) & 0x1);
            cfg.dram_drv_ohm = ddr3_dic_ohm(dic);
            cfg.dram_odt_ohm = ddr3_rtt_nom_ohm(rtt);
        }
        DramType::Lpddr3 => {
            cfg.dram_drv_ohm = lpddr3_ds_ohm(mr3 & 0xF);
            cfg.dram_odt_ohm = lpddr3_odt_ohm(mr11 & 0x3);
        }
        DramType::Lpddr4 => {
            cfg.dram_drv_ohm = lpddr4_pdds_ohm((mr3 >> 3) & 0x7);
            cfg.dram_odt_ohm = lpddr4_odt_ohm(mr11 & 0x7);
            cfg.dram_ca_odt_ohm = lpddr4_odt_ohm((mr11 >> 4) & 0x7);
        }
    }
    cfg
}

/// LPDDR3 MR3 drive code for the re-encoded mode registers, default drive.
pub fn lpddr3_drv_code(_config: &TimingRelatedConfig) -> u32 {
    0x2 // 40 ohm
}

/// LPDDR3 MR11 ODT code; termination off when ODT is disabled.
pub fn lpddr3_odt_code(config: &TimingRelatedConfig) -> u32 {
    if config.odt_enable { 0x2 } else { 0x0 } // 120 ohm
}

/// LPDDR4 MR3 pull-down drive code, default drive.
pub fn lpddr4_drv_code(_config: &TimingRelatedConfig) -> u32 {
    0x6 << 3 // 40 ohm
}

/// LPDDR4 MR11 DQ+CA ODT codes; termination off when ODT is disabled.
pub fn lpddr4_odt_code(config: &TimingRelatedConfig) -> u32 {
    if config.odt_enable {
        (0x4 << 4) | 0x4 // CA and DQ at 60 ohm
    } else {
        0
    }
}

/// LPDDR4 MR22 SoC-side ODT code.
pub fn lpddr4_soc_odt_code(config: &TimingRelatedConfig) -> u32 {
    if config.odt_enable { 0x2 } else { 0 } // 120 ohm
}
