//! Connection state management
//!
//! Tracks the socket lifecycle of the call client and counts reconnect
//! attempts against its [`ReconnectionStrategy`]. This is the only place
//! the state changes; callers observe it through `RpcClient::state()` and
//! the client events.
//!
//! # State Transitions
//!
//! ```text
//!                   connect()
//! Disconnected ───────────────► Connecting ──open──► Connected
//!      ▲                          │    ▲                 │
//!      │                   error/ │    │ retry           │ unexpected close
//!      │                  timeout ▼    │                 ▼
//!      │                        Error  Reconnecting{n} ◄─┘
//!      │                          │          ▲
//!      └── budget exhausted ──────┴──────────┘
//! ```
//!
//! `disconnect()` moves any state to `Disconnected`.

use crate::reconnect::ReconnectionStrategy;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, and no retry pending
    Disconnected,
    /// Socket open in progress
    Connecting,
    /// Socket open
    Connected,
    /// Waiting to retry after an unexpected close; `attempt` starts at 1
    Reconnecting {
        /// Retry number since the last successful connection
        attempt: u32,
    },
    /// The last open attempt failed
    Error,
}

impl ConnectionState {
    /// Numeric code recorded by the connection state gauge
    pub fn as_metric(&self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting { .. } => 3,
            ConnectionState::Error => 4,
        }
    }
}

struct Retry {
    strategy: Box<dyn ReconnectionStrategy>,
    attempts: u32,
}

/// Owns the connection state and the reconnect budget
pub struct ConnectionManager {
    state: RwLock<ConnectionState>,
    retry: Mutex<Retry>,
}

impl ConnectionManager {
    /// Create a manager in `Disconnected`
    pub fn new(strategy: Box<dyn ReconnectionStrategy>) -> Self {
        Self {
            state: RwLock::new(ConnectionState::Disconnected),
            retry: Mutex::new(Retry {
                strategy,
                attempts: 0,
            }),
        }
    }

    /// Current state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// True when the socket is open
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Move to `Connecting` unless already connected or connecting
    ///
    /// Returns `false` when another open is in progress or already done, in
    /// which case the caller must not open a second socket.
    pub async fn begin_connecting(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            ConnectionState::Connected | ConnectionState::Connecting => false,
            _ => {
                *state = ConnectionState::Connecting;
                true
            }
        }
    }

    /// The socket opened; the reconnect budget starts over
    pub async fn connected(&self) {
        *self.state.write().await = ConnectionState::Connected;
        let mut retry = self.retry.lock().await;
        retry.attempts = 0;
        retry.strategy.reset();
    }

    /// The open attempt failed
    pub async fn failed(&self) {
        *self.state.write().await = ConnectionState::Error;
    }

    /// The socket closed, or the caller disconnected
    ///
    /// Returns the state that was replaced.
    pub async fn disconnected(&self) -> ConnectionState {
        std::mem::replace(&mut *self.state.write().await, ConnectionState::Disconnected)
    }

    /// Consume one reconnect attempt
    ///
    /// Returns the attempt number and the delay to wait, moving to
    /// `Reconnecting { attempt }`. When the budget is spent the state
    /// settles on `Disconnected` and `None` is returned.
    pub async fn next_reconnect(&self) -> Option<(u32, Duration)> {
        let mut retry = self.retry.lock().await;
        let attempts = retry.attempts;
        match retry.strategy.next_delay(attempts) {
            Some(delay) => {
                retry.attempts = attempts + 1;
                *self.state.write().await = ConnectionState::Reconnecting {
                    attempt: retry.attempts,
                };
                Some((retry.attempts, delay))
            }
            None => {
                *self.state.write().await = ConnectionState::Disconnected;
                None
            }
        }
    }

    /// Attempts consumed since the last successful connection
    pub async fn reconnect_attempts(&self) -> u32 {
        self.retry.lock().await.attempts
    }
}
