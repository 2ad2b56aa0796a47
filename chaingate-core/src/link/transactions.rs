use std::{fmt, str::FromStr};

use flume::{Receiver as MpmcReceiver, Sender as MpmcSender};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::BlockHeight;

/// The receiving end of the channel for transaction execution reports.
pub type TransactionEventRx = MpmcReceiver<TransactionEvent>;
/// The sending end of the channel for transaction execution reports.
pub type TransactionEventTx = MpmcSender<TransactionEvent>;

/// The result of executing a transaction: `Ok(())` on success, otherwise the
/// failure reported by the platform's execution engine.
pub type ExecutionResult = Result<(), ExecutionError>;

/// The canonical identity of a transaction: the double SHA-256 digest of its
/// raw bytes, rendered as uppercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionHash([u8; 32]);

impl TransactionHash {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Computes the canonical hash of raw transaction bytes.
    pub fn digest(raw: &[u8]) -> Self {
        let inner = Sha256::digest(raw);
        Self(Sha256::digest(inner).into())
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionHash({self})")
    }
}

impl From<[u8; 32]> for TransactionHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for TransactionHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for TransactionHash {
    type Err = ParseHashError;

    /// Parses a hex transaction hash, accepting mixed case and an optional
    /// `0x`/`0X` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let mut bytes = [0; Self::LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

#[derive(Debug, Error)]
#[error("invalid transaction hash: {0}")]
pub struct ParseHashError(#[from] hex::FromHexError);

/// A transaction execution report observed on the node's event feed.
#[derive(Debug)]
pub struct TransactionEvent {
    pub hash: TransactionHash,
    /// The height of the block which included the transaction.
    pub height: BlockHeight,
    /// The raw transaction bytes, empty if the feed omitted them.
    pub raw: Vec<u8>,
    pub result: ExecutionResult,
}

/// The settled outcome of a transaction, as delivered to waiters.
///
/// A failed execution is still a successfully resolved outcome; it is data,
/// not an error.
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    pub raw: Vec<u8>,
    /// The height of the block which included the transaction.
    pub height: BlockHeight,
    pub result: ExecutionResult,
}

/// An execution failure reported by the platform, with a non-zero code and
/// an opaque diagnostic payload.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("transaction failed with code {code}: {info}")]
pub struct ExecutionError {
    pub code: u32,
    pub info: String,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrips_through_uppercase_hex() {
        let hash = TransactionHash::digest(b"hello!");
        let encoded = hash.to_string();
        assert_eq!(encoded, encoded.to_uppercase());
        assert_eq!(encoded.parse::<TransactionHash>().unwrap(), hash);
    }

    #[test]
    fn hash_parses_prefixed_and_mixed_case() {
        let hash = TransactionHash::digest(b"payload");
        let lower = hash.to_string().to_lowercase();
        assert_eq!(lower.parse::<TransactionHash>().unwrap(), hash);
        assert_eq!(
            format!("0x{lower}").parse::<TransactionHash>().unwrap(),
            hash
        );
    }

    #[test]
    fn hash_rejects_wrong_length() {
        assert!("DEADBEEF".parse::<TransactionHash>().is_err());
    }
}
