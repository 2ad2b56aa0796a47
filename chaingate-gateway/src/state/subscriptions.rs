use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chaingate_core::{
    link::transactions::{TransactionHash, TransactionOutcome},
    BlockHeight,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Waiters for the execution result of a specific transaction.
type ResultWaitersDb =
    Arc<scc::HashMap<TransactionHash, WaiterSet<TransactionOutcome>>>;
/// Waiters for a transaction's first observed inclusion in a block.
type InclusionWaitersDb =
    Arc<scc::HashMap<TransactionHash, WaiterSet<BlockHeight>>>;
/// Waiters for the chain to reach a target height.
type HeightWaitersDb = Arc<Mutex<Vec<HeightWaiter>>>;

/// A unique identifier for a single registration in the table.
pub(crate) type WaiterId = u64;

/// A global atomic counter for generating unique waiter IDs.
static WAITER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The subscription table: every pending interest in a future feed event,
/// indexed by topic.
///
/// The table itself is the only mutator of its maps; callers interact with
/// it exclusively through the `wait_for_*` registrations, the `send_*`
/// settlement calls (event processor only), and the detach handles carried
/// by the returned waiters. Size is bounded only by concurrently in-flight
/// registrations.
#[derive(Clone, Default)]
pub(crate) struct SubscriptionsDb {
    /// Registrations keyed by transaction hash, settled by the first
    /// observed execution result for that hash.
    results: ResultWaitersDb,
    /// Registrations keyed by transaction hash, settled by the first
    /// observed block that includes that hash.
    inclusions: InclusionWaitersDb,
    /// Height barriers, settled by the first block at or past their target.
    heights: HeightWaitersDb,
}

impl SubscriptionsDb {
    fn next_waiter_id() -> WaiterId {
        WAITER_COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers interest in the execution result of `hash`.
    pub(crate) fn wait_for_result(
        &self,
        hash: TransactionHash,
    ) -> Waiter<TransactionOutcome> {
        let id = Self::next_waiter_id();
        let (tx, rx) = oneshot::channel();
        self.results
            .entry(hash)
            .or_insert_with(WaiterSet::default)
            .add(id, tx);

        let results = self.results.clone();
        let detach = DetachHandle::new(move || {
            let emptied = results
                .update(&hash, |_, set| set.remove(id))
                .unwrap_or_default();
            // drop the key once its last waiter detaches
            if emptied {
                results.remove_if(&hash, |set| set.is_empty());
            }
        });
        Waiter { rx, detach }
    }

    /// Settles and removes every result waiter registered for `hash`.
    pub(crate) fn send_result_update(
        &self,
        hash: &TransactionHash,
        outcome: TransactionOutcome,
    ) {
        let Some((_, waiters)) = self.results.remove(hash) else {
            return;
        };
        waiters.settle(outcome);
    }

    /// Registers interest in the first observed block inclusion of `hash`.
    pub(crate) fn wait_for_inclusion(
        &self,
        hash: TransactionHash,
    ) -> Waiter<BlockHeight> {
        let id = Self::next_waiter_id();
        let (tx, rx) = oneshot::channel();
        self.inclusions
            .entry(hash)
            .or_insert_with(WaiterSet::default)
            .add(id, tx);

        let inclusions = self.inclusions.clone();
        let detach = DetachHandle::new(move || {
            let emptied = inclusions
                .update(&hash, |_, set| set.remove(id))
                .unwrap_or_default();
            if emptied {
                inclusions.remove_if(&hash, |set| set.is_empty());
            }
        });
        Waiter { rx, detach }
    }

    /// Settles and removes every inclusion waiter registered for `hash`.
    pub(crate) fn send_inclusion_update(
        &self,
        hash: &TransactionHash,
        height: BlockHeight,
    ) {
        let Some((_, waiters)) = self.inclusions.remove(hash) else {
            return;
        };
        waiters.settle(height);
    }

    /// Registers a barrier that settles once the chain reaches `target`.
    ///
    /// The caller is responsible for the fast path: this always creates a
    /// registration, even if the cursor is already past the target.
    pub(crate) fn wait_for_height(
        &self,
        target: BlockHeight,
    ) -> Waiter<BlockHeight> {
        let id = Self::next_waiter_id();
        let (tx, rx) = oneshot::channel();
        self.heights.lock().push(HeightWaiter { id, target, tx });

        let heights = self.heights.clone();
        let detach = DetachHandle::new(move || {
            heights.lock().retain(|waiter| waiter.id != id);
        });
        Waiter { rx, detach }
    }

    /// Settles every height barrier whose target is at or below `height`.
    pub(crate) fn send_block_update(&self, height: BlockHeight) {
        let mut settled = Vec::new();
        {
            let mut waiters = self.heights.lock();
            let mut index = 0;
            while index < waiters.len() {
                if waiters[index].target <= height {
                    settled.push(waiters.swap_remove(index));
                } else {
                    index += 1;
                }
            }
        }
        for waiter in settled {
            let _ = waiter.tx.send(height);
        }
    }

    #[cfg(test)]
    pub(crate) fn result_waiters(&self, hash: &TransactionHash) -> usize {
        self.results.read(hash, |_, set| set.len()).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn inclusion_waiters(&self, hash: &TransactionHash) -> usize {
        self.inclusions
            .read(hash, |_, set| set.len())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn height_waiters(&self) -> usize {
        self.heights.lock().len()
    }
}

/// The waiters registered under a single topic key.
struct WaiterSet<T>(Vec<(WaiterId, oneshot::Sender<T>)>);

impl<T> Default for WaiterSet<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Clone> WaiterSet<T> {
    fn add(&mut self, id: WaiterId, tx: oneshot::Sender<T>) {
        self.0.push((id, tx));
    }

    /// Removes the waiter with the given id.
    /// Returns `true` if the set is empty afterwards.
    fn remove(&mut self, id: WaiterId) -> bool {
        self.0.retain(|(waiter, _)| *waiter != id);
        self.0.is_empty()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Delivers `value` to every waiter in the set, consuming it. A waiter
    /// whose receiver is already gone is skipped.
    fn settle(self, value: T) {
        for (_, tx) in self.0 {
            let _ = tx.send(value.clone());
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.len()
    }
}

/// A height barrier registration.
struct HeightWaiter {
    id: WaiterId,
    target: BlockHeight,
    tx: oneshot::Sender<BlockHeight>,
}

/// An in-flight registration: the settlement receiver plus the handle that
/// removes the registration from the table.
pub(crate) struct Waiter<T> {
    /// Resolves with the settlement value, or errs if the registration was
    /// removed without being settled.
    pub(crate) rx: oneshot::Receiver<T>,
    detach: DetachHandle,
}

impl<T> Waiter<T> {
    /// Removes this registration from the table. Idempotent; also runs on
    /// drop, so every exit path of a wait detaches exactly once.
    pub(crate) fn detach(&mut self) {
        self.detach.detach();
    }
}

/// Deferred removal of a registration from the subscription table.
///
/// The closure runs at most once: on the first explicit [`detach`] call or
/// on drop, whichever comes first. Synchronous, so dropping a cancelled wait
/// future completes its cleanup before control returns to the caller.
///
/// [`detach`]: DetachHandle::detach
struct DetachHandle(Option<Box<dyn FnOnce() + Send>>);

impl DetachHandle {
    fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(callback)))
    }

    fn detach(&mut self) {
        if let Some(callback) = self.0.take() {
            callback();
        }
    }
}

impl Drop for DetachHandle {
    fn drop(&mut self) {
        self.detach();
    }
}
