use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::config::PollConfig;

/// Interval between nominal poll ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Lifecycle of a poller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollerState {
    /// First refresh not finished yet
    #[default]
    Uninitialized,
    /// Idle between ticks
    Ready,
    /// A cycle is in flight
    Polling,
    /// The first refresh failed; terminal
    Failed(String),
    /// Torn down
    Stopped,
}

impl PollerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Polling => "polling",
            Self::Failed(_) => "failed",
            Self::Stopped => "stopped",
        }
    }
}

impl Serialize for PollerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Commands accepted by a running poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    /// Run a cycle now; the tick schedule is unaffected
    Refresh,
    /// Cancel any in-flight cycle and exit
    Shutdown,
}

/// Diagnostics published next to the sensor state
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PollerStatus {
    pub state: PollerState,
    /// Completed or abandoned cycles, including the first refresh
    pub total_cycles: u64,
    pub failed_cycles: u64,
    /// Ticks skipped because a cycle was still running
    pub overrun_count: u64,
    pub last_error: Option<String>,
    /// `last_update` of the latest successful cycle
    pub last_success: Option<String>,
    pub interval_secs: u64,
}

/// Tunables of a poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub interval: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollerSettings {
    pub fn from_config(cfg: &PollConfig) -> Self {
        Self {
            interval: Duration::from_secs(cfg.interval_secs.max(1)),
        }
    }

    /// Same settings with a different interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
