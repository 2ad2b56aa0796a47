use std::{ffi::OsString, fs, path::PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::{feed::FeedConfig, node::NodeConfig, wait::WaitConfig};

pub mod feed;
pub mod node;
pub mod wait;
#[cfg(test)]
mod tests;

/// Top-level gateway configuration, assembled from multiple sources.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct GatewayParams {
    /// Connection to the node's event feed.
    pub feed: FeedConfig,
    /// Connection to the node's historical lookup RPC.
    pub node: NodeConfig,
    /// Wait policy: proof window and default deadline.
    pub wait: WaitConfig,
}

/// CLI overlay for [`GatewayParams`]. Any flag left unset falls back to the
/// TOML file value, which in turn falls back to the defaults.
#[derive(Debug, Parser)]
#[command(name = "chaingate", about = "Platform gateway result correlator")]
struct CliParams {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CHAINGATE_CONFIG")]
    config: Option<PathBuf>,
    /// Websocket URL of the node's event feed.
    #[arg(long, env = "CHAINGATE_FEED_URL")]
    feed_url: Option<url::Url>,
    /// HTTP URL of the node's RPC endpoint.
    #[arg(long, env = "CHAINGATE_NODE_URL")]
    node_url: Option<url::Url>,
    /// Number of confirmed blocks required past inclusion before a proof
    /// is considered retrievable.
    #[arg(long)]
    proof_window: Option<u64>,
}

impl GatewayParams {
    /// Assembles the final configuration.
    /// Precedence: CLI (if set) > TOML file > defaults.
    pub fn try_new(
        args: impl Iterator<Item = OsString>,
    ) -> Result<Self, ConfigError> {
        let cli = CliParams::parse_from(args);

        let mut params = match &cli.config {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| {
                    ConfigError::Read { path: path.clone(), source }
                })?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };

        if let Some(url) = cli.feed_url {
            params.feed.url = url;
        }
        if let Some(url) = cli.node_url {
            params.node.url = url;
        }
        if let Some(window) = cli.proof_window {
            params.wait.proof_window = window;
        }
        Ok(params)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}
