use std::sync::Arc;

use chaingate_config::WaitConfig;
use chaingate_core::{link::GatewayChannelEndpoints, BlockHeight};
use processor::EventProcessor;
use state::SharedState;
use tokio_util::sync::CancellationToken;

pub use error::GatewayError;
pub use feed::FeedClient;
pub use node::{LookupError, NodeRpcClient, TransactionArchive};

type GatewayResult<T> = Result<T, GatewayError>;

/// The transaction-result correlation layer of the gateway.
///
/// Request handlers submit a transaction hash and a deadline and receive the
/// execution outcome once the proof window for that transaction has elapsed.
/// This is the only component the rest of the gateway calls directly; the
/// feed client and the historical archive are wired in at construction.
pub struct Gateway {
    state: SharedState,
    archive: Arc<dyn TransactionArchive>,
    proof_window: u64,
}

impl Gateway {
    /// Creates the gateway and hooks it into the feed via the link channels.
    ///
    /// Spawns the event processor task, which terminates when `cancel` is
    /// triggered.
    pub fn new(
        channels: &GatewayChannelEndpoints,
        archive: Arc<dyn TransactionArchive>,
        config: &WaitConfig,
        cancel: CancellationToken,
    ) -> Self {
        let state = SharedState::new();
        EventProcessor::start(&state, channels, cancel);
        Self {
            state,
            archive,
            proof_window: config.proof_window,
        }
    }

    /// The highest block height observed on the feed so far. Non-blocking.
    pub fn current_height(&self) -> BlockHeight {
        self.state.blocks.current()
    }
}

mod error;
mod feed;
mod node;
mod processor;
mod state;
mod utils;
mod wait;
