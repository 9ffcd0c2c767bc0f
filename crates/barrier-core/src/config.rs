//! Barrier configuration.

use crate::MAX_DATAGRAM_SIZE;
use crate::barrier::BarrierError;
use std::time::Duration;

/// Tunables for one barrier episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierConfig {
    /// UDP port every peer listens on and sends to (default: 12345)
    pub port: u16,
    /// How often announcements are re-sent (default: 2s)
    pub broadcast_interval: Duration,
    /// Total time to wait for every peer before giving up (default: 30s)
    pub deadline: Duration,
    /// Receive buffer size in bytes (default: 1024)
    pub buffer_size: usize,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            port: 12345,
            broadcast_interval: Duration::from_secs(2),
            deadline: Duration::from_secs(30),
            buffer_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl BarrierConfig {
    /// Reject settings the event loop cannot run with.
    ///
    /// The episode clock has millisecond resolution, so the interval and
    /// the deadline must each be at least one millisecond. An interval
    /// that is not shorter than the deadline is accepted: the episode
    /// still terminates, it just gets at most one broadcast out.
    /// Use [`BarrierConfig::interval_exceeds_deadline`] to warn about it.
    pub fn validate(&self) -> Result<(), BarrierError> {
        if self.broadcast_interval_ms() == 0 {
            return Err(BarrierError::InvalidConfig(
                "broadcast interval must be at least 1ms".into(),
            ));
        }
        if self.deadline_ms() == 0 {
            return Err(BarrierError::InvalidConfig("deadline must be at least 1ms".into()));
        }
        if self.buffer_size == 0 {
            return Err(BarrierError::InvalidConfig("buffer size must be positive".into()));
        }
        Ok(())
    }

    pub fn interval_exceeds_deadline(&self) -> bool {
        self.broadcast_interval >= self.deadline
    }

    pub(crate) fn broadcast_interval_ms(&self) -> u64 {
        millis(self.broadcast_interval)
    }

    pub(crate) fn deadline_ms(&self) -> u64 {
        millis(self.deadline)
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
