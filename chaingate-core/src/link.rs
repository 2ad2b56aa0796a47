use blocks::{BlockUpdateRx, BlockUpdateTx};
use transactions::{TransactionEventRx, TransactionEventTx};

pub mod blocks;
pub mod transactions;

/// Channel endpoints held by the gateway's event processor.
pub struct GatewayChannelEndpoints {
    pub transaction_event_rx: TransactionEventRx,
    pub block_update_rx: BlockUpdateRx,
}

/// Channel endpoints held by the feed client, which translates raw feed
/// messages into typed events and pushes them over the link.
pub struct FeedChannelEndpoints {
    pub transaction_event_tx: TransactionEventTx,
    pub block_update_tx: BlockUpdateTx,
}

/// Creates the link between the feed client and the gateway.
pub fn link() -> (GatewayChannelEndpoints, FeedChannelEndpoints) {
    let (transaction_event_tx, transaction_event_rx) = flume::unbounded();
    let (block_update_tx, block_update_rx) = flume::unbounded();
    let gateway = GatewayChannelEndpoints {
        transaction_event_rx,
        block_update_rx,
    };
    let feed = FeedChannelEndpoints {
        transaction_event_tx,
        block_update_tx,
    };
    (gateway, feed)
}
