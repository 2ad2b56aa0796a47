use std::sync::Arc;

use chaingate_core::link::{
    blocks::{BlockUpdate, BlockUpdateRx},
    transactions::{TransactionEvent, TransactionEventRx, TransactionOutcome},
    GatewayChannelEndpoints,
};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::state::{
    blocks::HeightCursor, subscriptions::SubscriptionsDb,
    transactions::TransactionsCache, SharedState,
};

/// The single consumer of the link channels.
///
/// Exactly one instance runs per gateway: every feed message is handled to
/// completion before the next one, which is what makes "advance the cursor,
/// then notify" atomic and gives each topic FIFO delivery.
pub(crate) struct EventProcessor {
    subscriptions: SubscriptionsDb,
    transactions: TransactionsCache,
    blocks: Arc<HeightCursor>,
    transaction_event_rx: TransactionEventRx,
    block_update_rx: BlockUpdateRx,
}

impl EventProcessor {
    fn new(channels: &GatewayChannelEndpoints, state: &SharedState) -> Self {
        Self {
            subscriptions: state.subscriptions.clone(),
            transactions: state.transactions.clone(),
            blocks: state.blocks.clone(),
            transaction_event_rx: channels.transaction_event_rx.clone(),
            block_update_rx: channels.block_update_rx.clone(),
        }
    }

    pub(crate) fn start(
        state: &SharedState,
        channels: &GatewayChannelEndpoints,
        cancel: CancellationToken,
    ) {
        let processor = EventProcessor::new(channels, state);
        tokio::spawn(processor.run(cancel));
    }

    async fn run(self, cancel: CancellationToken) {
        info!("event processor is running");
        loop {
            tokio::select! {
                biased; Ok(event) = self.transaction_event_rx.recv_async() => {
                    self.observe_transaction(event);
                }
                Ok(update) = self.block_update_rx.recv_async() => {
                    self.observe_block(update);
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }
        info!("event processor has terminated");
    }

    /// Records an execution result and settles the waiters registered for
    /// its hash. The cache is written first so that a caller racing this
    /// handler either gets settled or finds the outcome on the fast path.
    fn observe_transaction(&self, event: TransactionEvent) {
        let TransactionEvent { hash, height, raw, result } = event;
        let outcome = TransactionOutcome { raw, height, result };
        self.transactions.insert(hash, outcome.clone());
        self.subscriptions.send_result_update(&hash, outcome);
    }

    /// Advances the height cursor, then fans the block out to height
    /// barriers and to inclusion waiters of every transaction it carries.
    fn observe_block(&self, update: BlockUpdate) {
        self.blocks.advance(update.height);
        self.subscriptions.send_block_update(update.height);
        for hash in &update.included {
            self.subscriptions.send_inclusion_update(hash, update.height);
        }
    }
}
