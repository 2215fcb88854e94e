//! Discovery configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Upper bound for one discovery call. A call that exceeds it counts as
    /// an empty result.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DiscoveryConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
