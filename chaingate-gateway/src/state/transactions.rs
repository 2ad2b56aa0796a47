use std::sync::Arc;

use chaingate_core::link::transactions::{TransactionHash, TransactionOutcome};

use super::ExpiringCache;

/// A thread-safe, expiring cache of observed transaction outcomes.
///
/// Populated by the event processor the moment a result is seen on the feed,
/// so that callers arriving afterwards resolve without registering a waiter
/// or touching the historical archive.
pub(crate) type TransactionsCache =
    Arc<ExpiringCache<TransactionHash, TransactionOutcome>>;
