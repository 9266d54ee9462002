//! Millisecond budgets as monotonic deadlines.
//!
//! A [`Deadline`] is derived once from an optional timeout argument and then
//! queried; it is never recomputed while a wait is in progress. Built on
//! `tokio::time::Instant`, so it is immune to wall-clock adjustment and can be
//! paused in tests.

use std::time::Duration;
use tokio::time::Instant;

/// An absolute monotonic instant to give up at, or no limit at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Wait forever.
    Never,
    /// Give up at this instant.
    At(Instant),
}

impl Deadline {
    /// Derive a deadline from a millisecond budget. A missing budget means
    /// wait forever.
    pub fn from_timeout_ms(timeout_ms: Option<u64>) -> Self {
        match timeout_ms {
            None => Deadline::Never,
            Some(ms) => Deadline::At(Instant::now() + Duration::from_millis(ms)),
        }
    }

    /// Time left until expiry. `None` means unbounded; zero means expired.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Deadline::Never => None,
            Deadline::At(at) => Some(at.saturating_duration_since(Instant::now())),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self {
            Deadline::Never => false,
            Deadline::At(at) => Instant::now() >= *at,
        }
    }
}
