use std::{sync::Arc, time::Duration};

use blocks::HeightCursor;
use cache::ExpiringCache;
use subscriptions::SubscriptionsDb;
use transactions::TransactionsCache;

/// A container for the shared, global state of the correlation layer.
///
/// Aggregates the thread-safe handles that are shared between the public
/// wait operations and the event processor: the height cursor, the cache of
/// recently observed outcomes, and the subscription table.
#[derive(Clone)]
pub(crate) struct SharedState {
    /// The highest block height observed on the feed; written only by the
    /// event processor.
    pub(crate) blocks: Arc<HeightCursor>,
    /// A cache of recently observed transaction outcomes, serving as the
    /// fast path for waiters that arrive after the result was seen.
    pub(crate) transactions: TransactionsCache,
    /// The central table of pending waiters, keyed by topic.
    pub(crate) subscriptions: SubscriptionsDb,
}

impl SharedState {
    /// Outcomes are retained a little longer than the typical provability
    /// deadline, so a handler that retries right after a timeout still hits
    /// the cache instead of re-registering a live waiter.
    const TRANSACTIONS_CACHE_TTL: Duration = Duration::from_secs(90);

    pub(crate) fn new() -> Self {
        Self {
            blocks: Arc::new(HeightCursor::new()),
            transactions: ExpiringCache::new(Self::TRANSACTIONS_CACHE_TTL)
                .into(),
            subscriptions: SubscriptionsDb::default(),
        }
    }
}

pub(crate) mod blocks;
pub(crate) mod cache;
pub(crate) mod subscriptions;
pub(crate) mod transactions;
