use flume::{Receiver as MpmcReceiver, Sender as MpmcSender};

use crate::{link::transactions::TransactionHash, BlockHeight};

/// The receiving end of the channel for new block observations.
pub type BlockUpdateRx = MpmcReceiver<BlockUpdate>;
/// The sending end of the channel for new block observations.
pub type BlockUpdateTx = MpmcSender<BlockUpdate>;

/// A message representing a new block observed on the feed.
///
/// Ephemeral: consumed to advance the height cursor and to fan out per-hash
/// inclusion notifications, never retained.
#[derive(Debug, Default)]
pub struct BlockUpdate {
    /// The height at which the block was committed.
    pub height: BlockHeight,
    /// Canonical hashes of the transactions included in the block, computed
    /// locally from the raw payloads carried by the feed message.
    pub included: Box<[TransactionHash]>,
}
