use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FeedConfig {
    /// Websocket URL of the node's event feed.
    pub url: Url,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

fn default_url() -> Url {
    "ws://127.0.0.1:26657/websocket"
        .parse()
        .expect("default feed url is valid")
}
