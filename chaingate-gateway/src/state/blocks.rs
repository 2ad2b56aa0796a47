use std::sync::atomic::{AtomicU64, Ordering};

use chaingate_core::BlockHeight;

/// The process-wide block height cursor.
///
/// Monotonically non-decreasing; starts at 0 and is advanced by the event
/// processor on every observed block. Every other component only reads it.
pub(crate) struct HeightCursor {
    latest: AtomicU64,
}

impl HeightCursor {
    pub(crate) fn new() -> Self {
        Self { latest: AtomicU64::new(0) }
    }

    /// Advances the cursor to `height` unless it is already past it.
    pub(crate) fn advance(&self, height: BlockHeight) {
        self.latest.fetch_max(height, Ordering::AcqRel);
    }

    /// The highest block height observed so far. Non-blocking.
    pub(crate) fn current(&self) -> BlockHeight {
        self.latest.load(Ordering::Acquire)
    }
}
