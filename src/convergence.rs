//! Polling a power-state source until it reports a target state.

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::PowerState;

/// Anything that can report the current power state.
pub trait PowerStateSource {
    /// Read the current state.
    fn power_state(&self) -> Result<PowerState>;
}

/// How often and how long to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergencePolicy {
    /// Maximum number of reads; zero behaves as one.
    pub attempts: u32,
    /// Sleep between consecutive reads.
    pub delay: Duration,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            delay: Duration::from_secs(2),
        }
    }
}

/// Read `source` until it reports `target`, at most `policy.attempts` times.
///
/// Returns the matching state. Read errors end the wait immediately; no sleep follows
/// the final read.
pub fn wait_for<S>(source: &S, target: PowerState, policy: ConvergencePolicy) -> Result<PowerState>
where
    S: PowerStateSource + ?Sized,
{
    let attempts = policy.attempts.max(1);
    let mut last = PowerState::Unknown;
    for attempt in 1..=attempts {
        last = source.power_state()?;
        if last == target {
            tracing::debug!(%target, attempt, "power state converged");
            return Ok(last);
        }
        if attempt < attempts {
            tracing::trace!(%target, observed = %last, attempt, "power state pending");
            thread::sleep(policy.delay);
        }
    }
    Err(Error::ConvergenceTimeout {
        target,
        last,
        attempts,
    })
}
