//! # Register programming engine
//!
//! Maps a derived [crate::timing::DramTimingSpec] onto the bit-exact layout
//! of the controller (CTL), PHY-interface (PI) and PHY banks, for one of
//! the two frequency-set slots and for every active channel. The F0/F1
//! layouts are fixed address maps expressed as `const` descriptor tables;
//! all writes go through the masked read-modify-write primitive in
//! [crate::regs], never blind overwrites.

pub mod ctl;
pub mod phy;
pub mod pi;

/// One of the two hardware frequency-set register banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreqSetSlot {
    F0,
    F1,
}

impl FreqSetSlot {
    pub const fn index(self) -> usize {
        match self {
            FreqSetSlot::F0 => 0,
            FreqSetSlot::F1 => 1,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            FreqSetSlot::F0 => FreqSetSlot::F1,
            FreqSetSlot::F1 => FreqSetSlot::F0,
        }
    }

    /// Slot for a raw index; out-of-range values have no hardware slot and
    /// are rejected by the orchestrator before any handoff.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(FreqSetSlot::F0),
            1 => Some(FreqSetSlot::F1),
            _ => None,
        }
    }
}
