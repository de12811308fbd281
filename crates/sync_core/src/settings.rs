use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the synchronization core. All delays are in milliseconds so the
/// struct reads naturally from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
    pub backoff_multiplier: u32,
    pub progress_interval_ms: u64,
    pub activity_clear_ms: u64,
    /// Control string sent once per established connection; `None` disables it.
    pub refresh_command: Option<String>,
    pub rehydrate_on_reconnect: bool,
    pub tap_capacity: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            reconnect_base_ms: 1_000,
            reconnect_max_ms: 30_000,
            backoff_multiplier: 2,
            progress_interval_ms: 100,
            activity_clear_ms: 1_500,
            refresh_command: Some("refresh_status".to_string()),
            rehydrate_on_reconnect: true,
            tap_capacity: 256,
        }
    }
}

impl SyncSettings {
    pub fn reconnect_base(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn activity_clear(&self) -> Duration {
        Duration::from_millis(self.activity_clear_ms)
    }
}
