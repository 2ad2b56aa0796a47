use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WaitConfig {
    /// Number of confirmed blocks required past a transaction's inclusion
    /// block before its proof is considered retrievable.
    pub proof_window: u64,
    /// Default deadline for provability waits, in seconds, applied when the
    /// caller does not supply one.
    pub default_timeout_secs: u64,
}

impl WaitConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            proof_window: default_proof_window(),
            default_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_proof_window() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    80
}
