//! # Register models for the RK3399 DRAM subsystem
//!
//! This crate models the register interfaces touched by the secure-world
//! DRAM frequency-scaling engine: the clock and reset unit (CRU) DPLL
//! registers, the per-channel DDR controller / PHY-interface / PHY banks,
//! the CIC handshake block and the PMU-side control bits for the M0
//! low-power microcontroller.
//!
//! Structured registers are modeled with [bitbybit] bitfields. The three
//! large timing banks are exposed as base addresses and word counts only;
//! the engine crate addresses them through descriptor tables because their
//! F0/F1 frequency-set layout is a fixed address map rather than a regular
//! structure.
#![no_std]

pub mod cic;
pub mod cru;
pub mod ddr;
pub mod pmu;

/// Number of DRAM channels on the SoC.
pub const CHANNEL_COUNT: usize = 2;
