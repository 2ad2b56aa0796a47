use chaingate_config::FeedConfig;
use chaingate_core::link::FeedChannelEndpoints;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use messages::FeedMessage;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::{utils::next_request_id, GatewayResult};

pub(crate) mod messages;

/// Feed query selecting transaction execution events.
const TRANSACTIONS_QUERY: &str = "tm.event = 'Tx'";
/// Feed query selecting new block events.
const NEW_BLOCKS_QUERY: &str = "tm.event = 'NewBlock'";

/// Owns the single connection to the node's event feed.
///
/// Subscribes once to the transaction and new-block queries and translates
/// every raw feed message into a typed link message for the event processor.
/// All translation is synchronous; nothing here blocks on downstream work.
pub struct FeedClient {
    url: Url,
    channels: FeedChannelEndpoints,
}

impl FeedClient {
    pub fn new(config: &FeedConfig, channels: FeedChannelEndpoints) -> Self {
        Self { url: config.url.clone(), channels }
    }

    /// Connects, subscribes to both event queries, and forwards messages
    /// until the connection drops, then returns.
    ///
    /// Reconnection is deliberately the embedder's responsibility. A dropped
    /// feed never synthesizes failures for pending waiters; their own
    /// deadlines handle the outage.
    pub async fn connect_and_listen(self) -> GatewayResult<()> {
        let (stream, _) = connect_async(self.url.as_str()).await?;
        info!("connected to event feed at {}", self.url);
        let (mut sink, mut stream) = stream.split();

        for query in [TRANSACTIONS_QUERY, NEW_BLOCKS_QUERY] {
            let subscribe = serde_json::json!({
                "jsonrpc": "2.0",
                "method": "subscribe",
                "id": next_request_id(),
                "params": { "query": query }
            });
            sink.send(Message::Text(subscribe.to_string())).await?;
        }
        debug!("subscribed to transaction and new-block events");

        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => self.handle_message(&text),
                Ok(Message::Close(_)) => {
                    info!("event feed connection closed");
                    break;
                }
                Err(err) => {
                    error!("event feed error: {err}");
                    break;
                }
                // ping, pong and binary frames carry no events
                _ => {}
            }
        }
        info!("disconnected from event feed");
        Ok(())
    }

    fn handle_message(&self, text: &str) {
        let translated = match messages::parse(text) {
            Ok(translated) => translated,
            Err(err) => {
                warn!("failed to handle feed message: {err}");
                return;
            }
        };
        for message in translated {
            match message {
                FeedMessage::Transaction(event) => {
                    debug!("observed result for transaction {}", event.hash);
                    let _ = self.channels.transaction_event_tx.send(event);
                }
                FeedMessage::Block(update) => {
                    let _ = self.channels.block_update_tx.send(update);
                }
            }
        }
    }
}
