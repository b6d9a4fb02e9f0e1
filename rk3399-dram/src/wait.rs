//! # Busy-wait policy
//!
//! Every synchronization point in this engine is a busy-wait on a hardware
//! status bit, and the hardware handshakes define no timeout: a block that
//! never acknowledges hangs the firmware. That is the named default here;
//! a hardened target can opt into bounded waits without changing any call
//! site.
use core::hint::spin_loop;

/// How long a poll loop is allowed to spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Spin until the condition holds. A non-acknowledging hardware state
    /// hangs the calling core.
    #[default]
    Infinite,
    /// Give up after this many poll iterations.
    Bounded(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("hardware did not acknowledge within the bounded wait")]
pub struct WaitTimeout;

/// Spin until `done` returns true, subject to `policy`.
pub fn wait_for(policy: WaitPolicy, mut done: impl FnMut() -> bool) -> Result<(), WaitTimeout> {
    match policy {
        WaitPolicy::Infinite => {
            while !done() {
                spin_loop();
            }
            Ok(())
        }
        WaitPolicy::Bounded(max) => {
            for _ in 0..max {
                if done() {
                    return Ok(());
                }
                spin_loop();
            }
            Err(WaitTimeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_wait_times_out() {
        assert_eq!(wait_for(WaitPolicy::Bounded(8), || false), Err(WaitTimeout));
    }

    #[test]
    fn bounded_wait_succeeds() {
        let mut polls = 0;
        let res = wait_for(WaitPolicy::Bounded(8), || {
            polls += 1;
            polls == 3
        });
        assert_eq!(res, Ok(()));
        assert_eq!(polls, 3);
    }

    #[test]
    fn infinite_wait_returns_once_satisfied() {
        let mut polls = 0;
        let res = wait_for(WaitPolicy::Infinite, || {
            polls += 1;
            polls == 5
        });
        assert_eq!(res, Ok(()));
    }
}
