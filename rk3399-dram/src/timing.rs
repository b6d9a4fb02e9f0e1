//! # JEDEC timing parameter derivation
//!
//! Converts a `(DramType, frequency, die geometry)` tuple into the full
//! [DramTimingSpec] record consumed by the register programming engine.
//! Everything is integer math: durations are carried in picoseconds and
//! converted to controller cycles with ceiling rounding, so a derived delay
//! can never undershoot the physical requirement.
use crate::{DramType, TimingRelatedConfig};

/// Sentinel returned by the latency-adjustment lookups when the CAS latency
/// is not an exact table entry. A miss means a board misconfiguration;
/// nothing downstream validates the sentinel before it reaches hardware.
pub const LAT_ADJ_MISS: u32 = 0xFF;

/// PHY-interface input-enable window, picoseconds.
const PI_IE_ENABLE_PS: u32 = 3000;
/// PHY-interface termination-select window, picoseconds.
const PI_TSEL_ENABLE_PS: u32 = 700;
/// Additive latency configured in the PHY interface.
const PI_ADD_LATENCY: u32 = 0;
/// Round-trip board delay outside the PHY, picoseconds.
const PI_ROUND_TRIP_PS: u32 = 1600;
/// Fixed PHY-internal pipeline stages on the read path.
const PI_PHY_INTERNAL_CYCLES: u32 = 11;

/// One latency/adjustment table row: read adjustment keyed by CL, write
/// adjustment keyed by CWL.
struct LatAdjPair {
    cl: u32,
    rdlat_adj: u32,
    cwl: u32,
    wrlat_adj: u32,
}

const fn pair(cl: u32, rdlat_adj: u32, cwl: u32, wrlat_adj: u32) -> LatAdjPair {
    LatAdjPair {
        cl,
        rdlat_adj,
        cwl,
        wrlat_adj,
    }
}

const DDR3_LAT_ADJ: &[LatAdjPair] = &[
    pair(6, 5, 5, 4),
    pair(8, 7, 6, 5),
    pair(10, 9, 7, 6),
    pair(11, 9, 8, 7),
    pair(13, 0xB, 9, 8),
    pair(14, 0xB, 10, 9),
];

const LPDDR3_LAT_ADJ: &[LatAdjPair] = &[
    pair(3, 2, 1, 0),
    pair(6, 5, 3, 2),
    pair(8, 7, 4, 3),
    pair(9, 8, 5, 4),
    pair(10, 9, 6, 5),
    pair(11, 9, 6, 5),
    pair(12, 0xA, 6, 5),
    pair(14, 0xC, 8, 7),
    pair(16, 0xD, 8, 7),
];

const LPDDR4_LAT_ADJ: &[LatAdjPair] = &[
    pair(6, 5, 4, 2),
    pair(10, 9, 6, 4),
    pair(14, 0xC, 8, 6),
    pair(20, 0x11, 10, 8),
    pair(24, 0x15, 12, 10),
    pair(28, 0x18, 14, 12),
    pair(32, 0x1B, 16, 14),
    pair(36, 0x1E, 18, 16),
];

fn lat_adj_table(dram_type: DramType) -> &'static [LatAdjPair] {
    match dram_type {
        DramType::Ddr3 => DDR3_LAT_ADJ,
        DramType::Lpddr3 => LPDDR3_LAT_ADJ,
        DramType::Lpddr4 => LPDDR4_LAT_ADJ,
    }
}

/// Read-latency adjustment for the given CAS latency, [LAT_ADJ_MISS] if
/// `cl` is not an exact table entry.
pub fn get_rdlat_adj(dram_type: DramType, cl: u32) -> u32 {
    lat_adj_table(dram_type)
        .iter()
        .find(|p| p.cl == cl)
        .map_or(LAT_ADJ_MISS, |p| p.rdlat_adj)
}

/// Write-latency adjustment for the given write latency, [LAT_ADJ_MISS] if
/// `cwl` is not an exact table entry.
pub fn get_wrlat_adj(dram_type: DramType, cwl: u32) -> u32 {
    lat_adj_table(dram_type)
        .iter()
        .find(|p| p.cwl == cwl)
        .map_or(LAT_ADJ_MISS, |p| p.wrlat_adj)
}

/// Length of one controller cycle in picoseconds.
#[inline]
pub const fn tck_ps(mhz: u32) -> u32 {
    1_000_000 / mhz
}

/// Picoseconds to cycles, rounded up.
pub fn cycles_from_ps(ps: u32, mhz: u32) -> u32 {
    let tck = tck_ps(mhz);
    let mut cycles = ps / tck;
    if ps % tck != 0 {
        cycles += 1;
    }
    cycles
}

/// Nanoseconds to cycles, rounded up.
pub fn cycles_from_ns(ns: u32, mhz: u32) -> u32 {
    cycles_from_ps(ns * 1000, mhz)
}

/// Microseconds to cycles, exact.
pub const fn cycles_from_us(us: u32, mhz: u32) -> u32 {
    us * mhz
}

/// The JEDEC "max(n clocks, t ns)" pattern.
fn max_ck_ps(ck: u32, ps: u32, mhz: u32) -> u32 {
    ck.max(cycles_from_ps(ps, mhz))
}

/// PHY-interface read latency: CAS latency shortened by the input-enable
/// and termination-select windows, never below 2 cycles.
pub fn get_pi_rdlat_adj(spec: &DramTimingSpec) -> u32 {
    let rdlat = spec.cl + PI_ADD_LATENCY;
    let delay_adder = cycles_from_ps(PI_IE_ENABLE_PS, spec.mhz) - 1;
    let tsel_adder = cycles_from_ps(PI_TSEL_ENABLE_PS, spec.mhz);
    let extra_adder = tsel_adder.saturating_sub(delay_adder);
    // Half-cycle resolution of the high-speed read path.
    let hs_offset = 1;

    if delay_adder > rdlat - 1 - hs_offset {
        rdlat - tsel_adder
    } else if rdlat - delay_adder < 2 {
        2
    } else {
        rdlat - delay_adder - extra_adder
    }
}

/// PHY-interface write latency adjustment, straight from the per-type
/// table.
pub fn get_pi_wrlat_adj(dram_type: DramType, spec: &DramTimingSpec) -> u32 {
    get_wrlat_adj(dram_type, spec.cwl)
}

/// Total DFI read latency budget: round-trip board delay plus the PHY
/// pipeline, on top of the CAS latency.
pub fn get_pi_tdfi_phy_rdlat(spec: &DramTimingSpec) -> u32 {
    let trip_cycles = cycles_from_ps(PI_ROUND_TRIP_PS, spec.mhz);
    spec.cl + PI_ADD_LATENCY + trip_cycles + PI_PHY_INTERNAL_CYCLES
}

/// Earliest ODT turn-off after a read, cycles. DDR3 has no offset.
pub fn get_pi_todtoff_min(dram_type: DramType, mhz: u32) -> u32 {
    let ps = match dram_type {
        DramType::Ddr3 => 0,
        DramType::Lpddr3 => 2500,
        DramType::Lpddr4 => 1500,
    };
    if ps == 0 { 0 } else { cycles_from_ps(ps, mhz) }
}

/// Latest ODT turn-off after a read, cycles. DDR3 has no offset.
pub fn get_pi_todtoff_max(dram_type: DramType, mhz: u32) -> u32 {
    let ps = match dram_type {
        DramType::Ddr3 => 0,
        DramType::Lpddr3 => 3500,
        DramType::Lpddr4 => 3500,
    };
    if ps == 0 { 0 } else { cycles_from_ps(ps, mhz) }
}

/// Fully derived timing record for one target frequency. All quantities
/// are controller cycles at `mhz` unless a name says otherwise; mode
/// register words hold the JEDEC payload for the matching MRx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DramTimingSpec {
    pub mhz: u32,
    // Latencies, cycles.
    pub cl: u32,
    pub cwl: u32,
    pub al: u32,
    /// Burst length, beats.
    pub bl: u32,
    // Initialization.
    pub tinit1: u32,
    pub tinit3: u32,
    pub tinit4: u32,
    pub tinit5: u32,
    pub trstl: u32,
    pub trsth: u32,
    // Core array timing.
    pub trefi: u32,
    pub trcd: u32,
    pub trp: u32,
    pub trppb: u32,
    pub twr: u32,
    pub tdal: u32,
    pub trtp: u32,
    pub trc: u32,
    pub trrd: u32,
    pub tccd: u32,
    pub twtr: u32,
    pub trtw: u32,
    pub tras_min: u32,
    pub tras_max: u32,
    pub tfaw: u32,
    pub trfc: u32,
    pub tdqsck: u32,
    pub tdqsck_max: u32,
    // Power-state transitions.
    pub txsr: u32,
    pub txp: u32,
    pub txpdll: u32,
    pub tdllk: u32,
    pub tcke: u32,
    pub tckesr: u32,
    pub tcksre: u32,
    pub tcksrx: u32,
    pub tdpd: u32,
    // Mode register access.
    pub tmod: u32,
    pub tmrd: u32,
    pub tmrr: u32,
    pub tmrri: u32,
    // ODT.
    pub todton: u32,
    // ZQ calibration.
    pub tzqinit: u32,
    pub tzqcs: u32,
    pub tzqoper: u32,
    pub tzqreset: u32,
    pub tzqcke: u32,
    pub tzqlat: u32,
    // Write leveling.
    pub twlmrd: u32,
    pub twlo: u32,
    // Mode register payloads.
    pub mr: [u32; 4],
    pub mr11: u32,
    pub mr12: u32,
    pub mr13: u32,
    pub mr14: u32,
    pub mr22: u32,
}

/// Derive the full timing record for `mhz` on the configured DRAM type.
pub fn dram_get_parameter(config: &TimingRelatedConfig, mhz: u32) -> DramTimingSpec {
    match config.dram_type {
        DramType::Ddr3 => ddr3_timing(config, mhz),
        DramType::Lpddr3 => lpddr3_timing(config, mhz),
        DramType::Lpddr4 => lpddr4_timing(config, mhz),
    }
}

/// DDR3 speed-bin CL/CWL selection.
fn ddr3_cl_cwl(mhz: u32) -> (u32, u32) {
    match mhz {
        0..=400 => (6, 5),
        401..=533 => (8, 6),
        534..=666 => (10, 7),
        667..=800 => (11, 8),
        801..=933 => (13, 9),
        _ => (14, 10),
    }
}

/// tRFC by die capacity, picoseconds.
fn ddr3_trfc_ps(die_mbits: u32) -> u32 {
    match die_mbits {
        0..=512 => 90_000,
        513..=1024 => 110_000,
        1025..=2048 => 160_000,
        2049..=4096 => 300_000,
        _ => 350_000,
    }
}

fn lpddr3_trfc_ps(die_mbits: u32) -> u32 {
    match die_mbits {
        0..=4096 => 130_000,
        _ => 210_000,
    }
}

fn lpddr4_trfc_ps(die_mbits: u32) -> u32 {
    match die_mbits {
        0..=4096 => 180_000,
        8193.. => 380_000,
        _ => 280_000,
    }
}

fn largest_die_mbits(config: &TimingRelatedConfig) -> u32 {
    config
        .channel_info
        .iter()
        .take(config.channel_count)
        .map(|ch| ch.die_capacity_mbits())
        .max()
        .unwrap_or(0)
}

/// DDR3 MR0 write-recovery encoding, rounded up to the next valid value.
fn ddr3_mr0_wr_code(twr_cycles: u32) -> u32 {
    match twr_cycles {
        0..=5 => 1,
        6 => 2,
        7 => 3,
        8 => 4,
        9..=10 => 5,
        11..=12 => 6,
        13..=14 => 7,
        _ => 0, // 16 cycles
    }
}

fn ddr3_timing(config: &TimingRelatedConfig, mhz: u32) -> DramTimingSpec {
    let (cl, cwl) = ddr3_cl_cwl(mhz);
    let trfc = cycles_from_ps(ddr3_trfc_ps(largest_die_mbits(config)), mhz);
    let trefi = cycles_from_ps(7_800_000, mhz);
    let trp = cl;
    let twr = cycles_from_ps(15_000, mhz);
    let tras_min = cycles_from_ps(35_000, mhz);

    let mut spec = DramTimingSpec {
        mhz,
        cl,
        cwl,
        al: 0,
        bl: 8,
        tinit1: cycles_from_us(200, mhz),
        tinit3: cycles_from_us(500, mhz),
        tinit4: 10,
        // tXPR: exit-reset to first valid command.
        tinit5: trfc + cycles_from_ps(10_000, mhz),
        trstl: cycles_from_us(200, mhz),
        trsth: cycles_from_us(500, mhz),
        trefi,
        trcd: cl,
        trp,
        trppb: trp,
        twr,
        tdal: twr + trp,
        trtp: max_ck_ps(4, 7_500, mhz),
        trc: tras_min + trp,
        trrd: max_ck_ps(4, 10_000, mhz),
        tccd: 4,
        twtr: max_ck_ps(4, 7_500, mhz),
        trtw: 0,
        tras_min,
        tras_max: trefi * 9,
        tfaw: cycles_from_ps(40_000, mhz),
        trfc,
        tdqsck: 0,
        tdqsck_max: 0,
        txsr: trfc + cycles_from_ps(10_000, mhz),
        txp: max_ck_ps(3, 6_000, mhz),
        txpdll: max_ck_ps(10, 24_000, mhz),
        tdllk: 512,
        tcke: max_ck_ps(3, 5_000, mhz),
        tckesr: max_ck_ps(3, 5_000, mhz) + 1,
        tcksre: max_ck_ps(5, 10_000, mhz),
        tcksrx: max_ck_ps(5, 10_000, mhz),
        tdpd: 0,
        tmod: max_ck_ps(12, 15_000, mhz),
        tmrd: 4,
        tmrr: 0,
        tmrri: cl + 3,
        todton: cwl.saturating_sub(2),
        tzqinit: max_ck_ps(512, 640_000, mhz),
        tzqcs: max_ck_ps(64, 80_000, mhz),
        tzqoper: max_ck_ps(256, 320_000, mhz),
        tzqreset: max_ck_ps(3, 50_000, mhz),
        tzqcke: 0,
        tzqlat: 0,
        twlmrd: 40,
        twlo: cycles_from_ps(9_000, mhz),
        ..Default::default()
    };

    // MR0: burst length 8, CAS latency, write recovery, DLL reset.
    let cl_code = cl - 4;
    spec.mr[0] = ((cl_code & 0x7) << 4)
        | ((cl_code >> 3) << 2)
        | (ddr3_mr0_wr_code(twr) << 9)
        | (1 << 8);
    // MR1: DLL on, 40 ohm drive, Rtt_nom RZQ/4 when terminating.
    spec.mr[1] = if config.odt_enable { 1 << 2 } else { 0 };
    // MR2: CAS write latency.
    spec.mr[2] = (cwl - 5) << 3;
    spec.mr[3] = 0;
    spec
}

/// LPDDR3 RL/WL selection (DBI off set).
fn lpddr3_rl_wl(mhz: u32) -> (u32, u32) {
    match mhz {
        0..=166 => (3, 1),
        167..=400 => (6, 3),
        401..=533 => (8, 4),
        534..=666 => (10, 6),
        667..=800 => (12, 6),
        801..=933 => (14, 8),
        _ => (16, 8),
    }
}

/// LPDDR3 MR2 RL/WL code for the selected set.
fn lpddr3_mr2_rl_code(rl: u32) -> u32 {
    match rl {
        3 => 0x1,
        6 => 0x4,
        8 => 0x6,
        10 => 0x7,
        12 => 0x8,
        14 => 0xA,
        _ => 0xC,
    }
}

fn lpddr3_timing(config: &TimingRelatedConfig, mhz: u32) -> DramTimingSpec {
    let (rl, wl) = lpddr3_rl_wl(mhz);
    let trfc = cycles_from_ps(lpddr3_trfc_ps(largest_die_mbits(config)), mhz);
    let trefi = cycles_from_ps(3_904_000, mhz);
    let trp = max_ck_ps(3, 18_000, mhz);
    let twr = max_ck_ps(4, 15_000, mhz);
    let tras_min = max_ck_ps(3, 42_000, mhz);

    let mut spec = DramTimingSpec {
        mhz,
        cl: rl,
        cwl: wl,
        al: 0,
        bl: 8,
        tinit1: cycles_from_ps(100_000, mhz),
        tinit3: cycles_from_us(200, mhz),
        tinit4: cycles_from_us(1, mhz),
        tinit5: cycles_from_us(10, mhz),
        trstl: 0,
        trsth: 0,
        trefi,
        trcd: max_ck_ps(3, 18_000, mhz),
        trp,
        trppb: trp,
        twr,
        tdal: twr + trp,
        trtp: max_ck_ps(4, 7_500, mhz),
        trc: tras_min + trp,
        trrd: max_ck_ps(2, 10_000, mhz),
        tccd: 4,
        twtr: max_ck_ps(4, 7_500, mhz),
        trtw: 0,
        tras_min,
        tras_max: trefi * 9,
        tfaw: max_ck_ps(8, 50_000, mhz),
        trfc,
        tdqsck: cycles_from_ps(2_500, mhz),
        tdqsck_max: cycles_from_ps(5_500, mhz),
        txsr: trfc + cycles_from_ps(10_000, mhz),
        txp: max_ck_ps(3, 7_500, mhz),
        txpdll: 0,
        tdllk: 0,
        tcke: max_ck_ps(3, 7_500, mhz),
        tckesr: max_ck_ps(3, 15_000, mhz),
        tcksre: max_ck_ps(2, 5_000, mhz),
        tcksrx: max_ck_ps(2, 5_000, mhz),
        tdpd: cycles_from_us(500, mhz),
        tmod: 0,
        tmrd: max_ck_ps(10, 14_000, mhz),
        tmrr: 4,
        tmrri: max_ck_ps(3, 18_000, mhz) + 3,
        todton: cycles_from_ps(3_500, mhz),
        tzqinit: max_ck_ps(1, 1_000_000, mhz),
        tzqcs: max_ck_ps(1, 90_000, mhz),
        tzqoper: max_ck_ps(1, 360_000, mhz),
        tzqreset: max_ck_ps(3, 50_000, mhz),
        tzqcke: 0,
        tzqlat: 0,
        twlmrd: 40,
        twlo: cycles_from_ps(9_000, mhz),
        ..Default::default()
    };

    // nWR, rounded up to the programmable set.
    let nwr = twr.clamp(3, 16);
    // MR1: burst length 8, nWR.
    spec.mr[1] = ((nwr - 2) & 0x7) << 5 | 0x3;
    // MR2: RL/WL set code, write-leveling disabled.
    spec.mr[2] = lpddr3_mr2_rl_code(rl);
    // MR3: drive strength, re-encoded from the decoded configuration.
    spec.mr[3] = crate::odt::lpddr3_drv_code(config);
    spec.mr11 = crate::odt::lpddr3_odt_code(config);
    spec
}

/// LPDDR4 RL/WL selection (DBI off set).
fn lpddr4_rl_wl(mhz: u32) -> (u32, u32) {
    match mhz {
        0..=266 => (6, 4),
        267..=533 => (10, 6),
        534..=800 => (14, 8),
        801..=1066 => (20, 10),
        1067..=1333 => (24, 12),
        1334..=1600 => (28, 14),
        1601..=1866 => (32, 16),
        _ => (36, 18),
    }
}

/// LPDDR4 MR2 RL/WL set index.
fn lpddr4_mr2_code(rl: u32) -> u32 {
    match rl {
        6 => 0,
        10 => 1,
        14 => 2,
        20 => 3,
        24 => 4,
        28 => 5,
        32 => 6,
        _ => 7,
    }
}

/// LPDDR4 nWR code, rounded up to the next programmable value.
fn lpddr4_mr1_nwr_code(twr_cycles: u32) -> u32 {
    match twr_cycles {
        0..=6 => 0,
        7..=10 => 1,
        11..=16 => 2,
        17..=20 => 3,
        21..=24 => 4,
        25..=30 => 5,
        31..=34 => 6,
        _ => 7,
    }
}

fn lpddr4_timing(config: &TimingRelatedConfig, mhz: u32) -> DramTimingSpec {
    let (rl, wl) = lpddr4_rl_wl(mhz);
    let trfc = cycles_from_ps(lpddr4_trfc_ps(largest_die_mbits(config)), mhz);
    let trefi = cycles_from_ps(3_904_000, mhz);
    let trppb = max_ck_ps(4, 18_000, mhz);
    let trp = max_ck_ps(4, 21_000, mhz);
    let twr = max_ck_ps(6, 18_000, mhz);
    let tras_min = max_ck_ps(3, 42_000, mhz);

    let mut spec = DramTimingSpec {
        mhz,
        cl: rl,
        cwl: wl,
        al: 0,
        bl: 16,
        tinit1: cycles_from_us(200, mhz),
        tinit3: cycles_from_us(2000, mhz),
        tinit4: 5,
        tinit5: cycles_from_us(2, mhz),
        trstl: 0,
        trsth: 0,
        trefi,
        trcd: max_ck_ps(4, 18_000, mhz),
        trp,
        trppb,
        twr,
        tdal: twr + trppb,
        trtp: max_ck_ps(8, 7_500, mhz),
        trc: tras_min + trppb,
        trrd: max_ck_ps(4, 10_000, mhz),
        tccd: 8,
        twtr: max_ck_ps(8, 10_000, mhz),
        // Read-to-write turnaround absorbs the DQS uncertainty window.
        trtw: cycles_from_ps(3_500, mhz),
        tras_min,
        tras_max: trefi * 9,
        tfaw: cycles_from_ps(40_000, mhz),
        trfc,
        tdqsck: cycles_from_ps(1_500, mhz),
        tdqsck_max: cycles_from_ps(3_500, mhz),
        txsr: trfc + cycles_from_ps(7_500, mhz),
        txp: max_ck_ps(5, 7_500, mhz),
        txpdll: 0,
        tdllk: 0,
        tcke: max_ck_ps(4, 7_500, mhz),
        tckesr: max_ck_ps(4, 15_000, mhz),
        tcksre: max_ck_ps(2, 5_000, mhz),
        tcksrx: max_ck_ps(2, 5_000, mhz),
        tdpd: cycles_from_us(500, mhz),
        tmod: 0,
        tmrd: max_ck_ps(10, 14_000, mhz),
        tmrr: 8,
        tmrri: max_ck_ps(4, 18_000, mhz) + 3,
        todton: cycles_from_ps(1_500, mhz),
        tzqinit: max_ck_ps(1, 1_000_000, mhz),
        tzqcs: max_ck_ps(1, 30_000, mhz),
        tzqoper: max_ck_ps(1, 1_000_000, mhz),
        tzqreset: max_ck_ps(3, 50_000, mhz),
        tzqcke: max_ck_ps(2, 1_750, mhz),
        tzqlat: max_ck_ps(8, 30_000, mhz),
        twlmrd: 40,
        twlo: cycles_from_ps(9_000, mhz),
        ..Default::default()
    };

    spec.mr[1] = (lpddr4_mr1_nwr_code(twr) << 4) | if spec.bl == 16 { 0x0 } else { 0x1 };
    spec.mr[2] = lpddr4_mr2_code(rl);
    spec.mr[3] = crate::odt::lpddr4_drv_code(config)
        | if config.write_dbi { 1 << 7 } else { 0 }
        | if config.read_dbi { 1 << 6 } else { 0 };
    spec.mr11 = crate::odt::lpddr4_odt_code(config);
    // CA/DQ reference voltages, mid-range defaults.
    spec.mr12 = 0x4D;
    spec.mr13 = 0;
    spec.mr14 = 0x4D;
    spec.mr22 = crate::odt::lpddr4_soc_odt_code(config);
    spec
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use crate::ChannelInfo;

    pub(crate) fn default_config(dram_type: DramType) -> TimingRelatedConfig {
        TimingRelatedConfig {
            dram_type,
            channel_count: 2,
            channel_info: [ChannelInfo {
                rank_count: 2,
                col_bits: 10,
                bank_bits: 3,
                cs0_row_bits: 15,
                cs1_row_bits: 15,
                row_3_4: false,
            }; 2],
            burst_len: 8,
            auto_precharge: false,
            dll_bypass: false,
            odt_enable: true,
            read_dbi: false,
            write_dbi: false,
            freq_mhz: 800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tests_support::default_config as config;

    #[test]
    fn ceiling_rounding_never_undershoots() {
        // 7.8 us at 800 MHz: 7800000 / 1250 = 6240 exact.
        assert_eq!(cycles_from_ps(7_800_000, 800), 6240);
        // Non-exact division rounds up.
        assert_eq!(cycles_from_ps(1_001, 800), 1);
        assert_eq!(cycles_from_ps(1_251, 800), 2);
        // 15 ns at 666 MHz: tck 1501 ps, 15000/1501 = 9 r 1491 -> 10.
        assert_eq!(cycles_from_ns(15, 666), 10);
    }

    #[test]
    fn lat_adj_lookup_total_within_tables() {
        for (ty, table) in [
            (DramType::Ddr3, DDR3_LAT_ADJ),
            (DramType::Lpddr3, LPDDR3_LAT_ADJ),
            (DramType::Lpddr4, LPDDR4_LAT_ADJ),
        ] {
            for p in table {
                assert_eq!(get_rdlat_adj(ty, p.cl), p.rdlat_adj);
                assert_eq!(get_wrlat_adj(ty, p.cwl), p.wrlat_adj);
                assert_ne!(get_rdlat_adj(ty, p.cl), LAT_ADJ_MISS);
            }
        }
    }

    #[test]
    fn lat_adj_miss_returns_sentinel() {
        // Known risk: the sentinel is not validated downstream and would be
        // programmed into the latency-adjustment fields as-is.
        assert_eq!(get_rdlat_adj(DramType::Ddr3, 7), LAT_ADJ_MISS);
        assert_eq!(get_wrlat_adj(DramType::Lpddr4, 5), LAT_ADJ_MISS);
    }

    #[test]
    fn ladder_frequencies_stay_on_table() {
        // Every ladder entry must derive a CL/CWL pair that the adjustment
        // tables cover, otherwise the sentinel would reach hardware.
        for mhz in [928, 800, 732, 666, 600, 528, 400, 300, 200] {
            for ty in [DramType::Ddr3, DramType::Lpddr3, DramType::Lpddr4] {
                let spec = dram_get_parameter(&config(ty), mhz);
                assert_ne!(get_rdlat_adj(ty, spec.cl), LAT_ADJ_MISS, "{ty:?} {mhz}");
                assert_ne!(get_wrlat_adj(ty, spec.cwl), LAT_ADJ_MISS, "{ty:?} {mhz}");
            }
        }
    }

    #[test]
    fn todtoff_zero_for_ddr3() {
        assert_eq!(get_pi_todtoff_min(DramType::Ddr3, 800), 0);
        assert_eq!(get_pi_todtoff_max(DramType::Ddr3, 800), 0);
        assert!(get_pi_todtoff_min(DramType::Lpddr3, 800) > 0);
        assert!(get_pi_todtoff_max(DramType::Lpddr4, 800) >= get_pi_todtoff_min(DramType::Lpddr4, 800));
    }

    #[test]
    fn pi_rdlat_never_below_two() {
        for mhz in [200, 300, 400, 528, 600, 666, 732, 800, 928] {
            let spec = dram_get_parameter(&config(DramType::Lpddr4), mhz);
            assert!(get_pi_rdlat_adj(&spec) >= 2, "{mhz}");
        }
    }

    #[test]
    fn ddr3_mr0_encoding() {
        let spec = dram_get_parameter(&config(DramType::Ddr3), 800);
        // CL 11 -> code 7: A6:A4 = 7, A2 = 0.
        assert_eq!(spec.cl, 11);
        assert_eq!((spec.mr[0] >> 4) & 0x7, 7);
        assert_eq!((spec.mr[0] >> 2) & 0x1, 0);
        // twr = 15ns at 800 MHz = 12 cycles -> WR code 6.
        assert_eq!((spec.mr[0] >> 9) & 0x7, 6);
        // DLL reset requested.
        assert_eq!((spec.mr[0] >> 8) & 0x1, 1);
    }

    #[test]
    fn trc_is_ras_plus_precharge() {
        for ty in [DramType::Ddr3, DramType::Lpddr3, DramType::Lpddr4] {
            let spec = dram_get_parameter(&config(ty), 666);
            assert!(spec.trc > spec.tras_min);
            assert!(spec.tdal >= spec.twr + spec.trppb);
        }
    }
}
