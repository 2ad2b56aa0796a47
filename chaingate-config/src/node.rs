use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct NodeConfig {
    /// HTTP URL of the node's RPC endpoint, used for historical transaction
    /// lookups.
    pub url: Url,
    /// Per-request timeout for lookup calls, in seconds.
    pub request_timeout_secs: u64,
}

impl NodeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_url() -> Url {
    "http://127.0.0.1:26657"
        .parse()
        .expect("default node url is valid")
}

fn default_request_timeout_secs() -> u64 {
    10
}
