use chaingate_core::link::transactions::TransactionHash;
use thiserror::Error;

use crate::node::LookupError;

/// Errors surfaced by the gateway's wait operations.
///
/// An execution failure is never an error here: it is returned as a settled
/// [`TransactionOutcome`] carrying the failure code and diagnostic payload.
///
/// [`TransactionOutcome`]: chaingate_core::link::transactions::TransactionOutcome
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The deadline elapsed before the outcome (and, for successful
    /// transactions, the proof window) was reached. All registrations
    /// created by the wait are detached before this is returned.
    #[error("transaction {hash} did not become provable before the deadline")]
    ProvabilityTimeout { hash: TransactionHash },

    /// The historical lookup collaborator failed with something other than
    /// its well-known "not found" condition.
    #[error("historical lookup failed: {0}")]
    Lookup(String),

    /// The event feed connection failed.
    #[error("event feed error: {0}")]
    Feed(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// A registration was removed while a wait was still pending on it,
    /// which only happens when the gateway is shutting down.
    #[error("wait aborted: the gateway is shutting down")]
    Shutdown,

    #[error("lookup transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for GatewayError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Feed(Box::new(err))
    }
}

impl From<LookupError> for GatewayError {
    fn from(err: LookupError) -> Self {
        Self::Lookup(err.to_string())
    }
}
