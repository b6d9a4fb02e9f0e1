//! # Low-power state controller
//!
//! Three mechanisms can take the DRAM out of active service: the
//! controller's automatic idle entry (power-down, self-refresh, self-refresh
//! with memory-clock gating), the CIC-driven standby, and the externally
//! forced self-refresh asserted through the PMU soft-control word. A
//! frequency switch must unwind all of them first and restore them
//! afterwards, so the engine tracks the whole set as one packed status word
//! with an 8-bit group per channel.
use rk3399::{cru, ddr, pmu};

use crate::{
    DramType, DrvOdtLpConfig, TimingRelatedConfig,
    regs::{CIC_CTRL1, DramRegs, PMU_SFT_CON},
    wait::{WaitPolicy, WaitTimeout, wait_for},
};

/// Per-channel bits of the packed low-power status word. Channel 1 uses the
/// same layout shifted by [LP_STAT_CHANNEL_SHIFT].
pub const LP_STAT_AUTO_PD: u32 = 1 << 0;
pub const LP_STAT_AUTO_SR: u32 = 1 << 1;
pub const LP_STAT_AUTO_SR_MC_GATE: u32 = 1 << 2;
pub const LP_STAT_STANDBY: u32 = 1 << 3;
pub const LP_STAT_EXT_SREF: u32 = 1 << 4;
pub const LP_STAT_CHANNEL_SHIFT: u32 = 8;

const LP_STAT_CHANNEL_MASK: u32 = 0x1F;

/// Extract one channel's group from the packed word.
pub const fn channel_stat(stat: u32, channel: usize) -> u32 {
    (stat >> (LP_STAT_CHANNEL_SHIFT * channel as u32)) & LP_STAT_CHANNEL_MASK
}

/// Low-power states the device type can enter. DDR3 has no clock-gated
/// self-refresh variant.
pub const fn supported_states(dram_type: DramType) -> u32 {
    match dram_type {
        DramType::Ddr3 => {
            LP_STAT_AUTO_PD | LP_STAT_AUTO_SR | LP_STAT_STANDBY | LP_STAT_EXT_SREF
        }
        DramType::Lpddr3 | DramType::Lpddr4 => {
            LP_STAT_AUTO_PD
                | LP_STAT_AUTO_SR
                | LP_STAT_AUTO_SR_MC_GATE
                | LP_STAT_STANDBY
                | LP_STAT_EXT_SREF
        }
    }
}

/// Status bits implied by a set of idle thresholds: a nonzero threshold
/// arms the corresponding automatic entry on every populated channel,
/// limited to what the device type supports.
pub fn stat_from_thresholds(
    dram_type: DramType,
    drv: &DrvOdtLpConfig,
    channel_count: usize,
) -> u32 {
    let mut per_channel = 0;
    if drv.pd_idle > 0 {
        per_channel |= LP_STAT_AUTO_PD;
    }
    if drv.sr_idle > 0 {
        per_channel |= LP_STAT_AUTO_SR;
    }
    if drv.sr_mc_gate_idle > 0 {
        per_channel |= LP_STAT_AUTO_SR_MC_GATE;
    }
    if drv.standby_idle > 0 {
        per_channel |= LP_STAT_STANDBY;
    }
    per_channel &= supported_states(dram_type);
    let mut stat = 0;
    for channel in 0..channel_count {
        stat |= per_channel << (LP_STAT_CHANNEL_SHIFT * channel as u32);
    }
    stat
}

fn write_idle_thresholds(regs: &mut DramRegs, channel: usize, drv: &DrvOdtLpConfig) {
    let pd = ddr::LpPdIdle::default()
        .with_pd_idle(arbitrary_int::u12::new((drv.pd_idle & 0xFFF) as u16))
        .with_srpd_lite_idle(arbitrary_int::u12::new((drv.srpd_lite_idle & 0xFFF) as u16));
    regs.ctl[channel].write(ddr::CTL_LP_PD_IDLE, pd.raw_value());
    let sr = ddr::LpSrIdle::default()
        .with_sr_idle((drv.sr_idle & 0xFF) as u8)
        .with_sr_mc_gate_idle((drv.sr_mc_gate_idle & 0xFF) as u8)
        .with_standby_idle((drv.standby_idle & 0xFFFF) as u16);
    regs.ctl[channel].write(ddr::CTL_LP_SR_IDLE, sr.raw_value());
}

fn write_auto_enables(regs: &mut DramRegs, channel: usize, group: u32) {
    regs.ctl[channel].modify(ddr::CTL_LP_AUTO, |v| {
        ddr::LpAuto::new_with_raw_value(v)
            .with_auto_pd(group & LP_STAT_AUTO_PD != 0)
            .with_auto_sr(group & LP_STAT_AUTO_SR != 0)
            .with_auto_sr_mc_gate(group & LP_STAT_AUTO_SR_MC_GATE != 0)
            .raw_value()
    });
}

fn write_standby(regs: &mut DramRegs, channel: usize, enable: bool) {
    let bit = 1u16 << channel;
    let value = if enable { bit } else { 0 };
    regs.cic.write(CIC_CTRL1, cru::write_masked(value, bit));
}

/// Apply the configured idle thresholds and arm the matching automatic
/// low-power states. Returns the resulting packed status word.
pub fn dram_low_power_config(
    regs: &mut DramRegs,
    config: &TimingRelatedConfig,
    drv: &DrvOdtLpConfig,
) -> u32 {
    let stat = stat_from_thresholds(config.dram_type, drv, config.channel_count);
    for channel in 0..config.channel_count {
        write_idle_thresholds(regs, channel, drv);
        write_auto_enables(regs, channel, channel_stat(stat, channel));
        write_standby(
            regs,
            channel,
            channel_stat(stat, channel) & LP_STAT_STANDBY != 0,
        );
    }
    stat
}

/// Take every channel fully out of low power and return the packed status
/// word describing what was active, for a later [resume_low_power].
///
/// The forced self-refresh release waits for the controller to report the
/// exit; the explicit exit command waits for the mode-register path to go
/// idle before issuing and for the command state machine to settle after.
pub fn exit_low_power(
    regs: &mut DramRegs,
    config: &TimingRelatedConfig,
    wait: WaitPolicy,
) -> Result<u32, WaitTimeout> {
    let mut stat = 0;
    for channel in 0..config.channel_count {
        let shift = LP_STAT_CHANNEL_SHIFT * channel as u32;

        // Externally forced self-refresh through the PMU.
        let sref_bit = pmu::sft_con_sref_bit(channel);
        if regs.pmu.read(PMU_SFT_CON) & sref_bit != 0 {
            stat |= LP_STAT_EXT_SREF << shift;
            regs.pmu.clear_bits(PMU_SFT_CON, sref_bit);
            let ctl = &regs.ctl[channel];
            wait_for(wait, || {
                ddr::LpState::new_with_raw_value(ctl.read(ddr::CTL_LP_STATE)).sr_exit_done()
            })?;
        }

        // CIC standby.
        if regs.cic.read(CIC_CTRL1) & (1 << channel) != 0 {
            stat |= LP_STAT_STANDBY << shift;
            write_standby(regs, channel, false);
        }

        // Automatic idle entry.
        let auto = ddr::LpAuto::new_with_raw_value(regs.ctl[channel].read(ddr::CTL_LP_AUTO));
        if auto.auto_pd() {
            stat |= LP_STAT_AUTO_PD << shift;
        }
        if auto.auto_sr() {
            stat |= LP_STAT_AUTO_SR << shift;
        }
        if auto.auto_sr_mc_gate() {
            stat |= LP_STAT_AUTO_SR_MC_GATE << shift;
        }
        write_auto_enables(regs, channel, 0);

        // Kick the state machine out of whatever residual state remains.
        let ctl = &regs.ctl[channel];
        wait_for(wait, || {
            !ddr::MrrStatus::new_with_raw_value(ctl.read(ddr::CTL_MRR_STATUS)).busy()
        })?;
        regs.ctl[channel].modify(ddr::CTL_LP_CMD, |v| {
            ddr::LpCommand::new_with_raw_value(v)
                .with_lp_cmd(ddr::LP_CMD_EXIT_VALUE)
                .raw_value()
        });
        let ctl = &regs.ctl[channel];
        wait_for(wait, || {
            ddr::LpState::new_with_raw_value(ctl.read(ddr::CTL_LP_STATE))
                .lp_cmd_state()
                .value()
                == ddr::LP_STATE_IDLE
        })?;
    }
    Ok(stat)
}

/// Re-arm the low-power states recorded by [exit_low_power].
pub fn resume_low_power(regs: &mut DramRegs, config: &TimingRelatedConfig, saved: u32) {
    for channel in 0..config.channel_count {
        let group = channel_stat(saved, channel);
        write_auto_enables(regs, channel, group);
        write_standby(regs, channel, group & LP_STAT_STANDBY != 0);
        if group & LP_STAT_EXT_SREF != 0 {
            regs.pmu.set_bits(PMU_SFT_CON, pmu::sft_con_sref_bit(channel));
        }
    }
}

/// Runtime update of the idle thresholds and the ODT enable, as packed by
/// the non-secure caller: `arg0` carries the self-refresh family
/// (`sr_idle` in bits 0..8, `sr_mc_gate_idle` in 8..16, `standby_idle` in
/// 16..32), `arg1` the power-down family (`pd_idle` in bits 0..12,
/// `srpd_lite_idle` in 16..28) and `arg2` bit 0 the ODT enable.
///
/// Low power is fully exited before the thresholds change, so they are
/// written against a clean controller state; the new automatic entries
/// then re-engage lazily. The ODT change is latched into the
/// configuration and applied by the next frequency switch. Returns the
/// new packed status word.
pub fn set_odt_pd(
    regs: &mut DramRegs,
    config: &mut TimingRelatedConfig,
    drv: &mut DrvOdtLpConfig,
    wait: WaitPolicy,
    arg0: u32,
    arg1: u32,
    arg2: u32,
) -> Result<u32, WaitTimeout> {
    exit_low_power(regs, config, wait)?;
    drv.sr_idle = arg0 & 0xFF;
    drv.sr_mc_gate_idle = (arg0 >> 8) & 0xFF;
    drv.standby_idle = (arg0 >> 16) & 0xFFFF;
    drv.pd_idle = arg1 & 0xFFF;
    drv.srpd_lite_idle = (arg1 >> 16) & 0xFFF;
    config.odt_enable = arg2 & 0x1 != 0;
    Ok(dram_low_power_config(regs, config, drv))
}
