//! Reconnection policies
//!
//! A policy answers one question after a socket drops: how long to wait
//! before the next attempt, or whether to stop trying.
//!
//! Two transports use these with deliberately different bounds:
//!
//! - the call client retries a fixed number of times
//!   ([`FixedDelay::with_max_attempts`]) and then settles in
//!   `Disconnected` until someone calls `connect()` again;
//! - the push stream of the feed coordinator retries forever
//!   ([`FixedDelay::new`] with no bound), since it has no other way back
//!   to live data.
//!
//! ```rust
//! use livewire_client::{FixedDelay, ReconnectionStrategy};
//! use std::time::Duration;
//!
//! let mut bounded = FixedDelay::new(Duration::from_secs(3)).with_max_attempts(5);
//! assert_eq!(bounded.next_delay(4), Some(Duration::from_secs(3)));
//! assert_eq!(bounded.next_delay(5), None);
//!
//! let mut unbounded = FixedDelay::new(Duration::from_secs(2));
//! assert_eq!(unbounded.next_delay(10_000), Some(Duration::from_secs(2)));
//! ```

use std::time::Duration;

/// Trait for reconnection strategies
///
/// `attempt` counts the attempts already made since the last successful
/// connection, starting at 0. `reset()` is called once a connection opens.
pub trait ReconnectionStrategy: Send + Sync {
    /// Delay before the next attempt, or `None` to give up
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;

    /// Forget accumulated state after a successful connection
    fn reset(&mut self);
}

/// Constant delay between attempts, optionally bounded
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    /// Retry forever with the given delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Stop after `max_attempts` attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Configured bound, `None` when unbounded
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(self.delay),
        }
    }

    fn reset(&mut self) {}
}

/// Never reconnect
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl ReconnectionStrategy for NoReconnect {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn reset(&mut self) {}
}
