use std::time::Duration;

use chaingate_core::{
    link::transactions::{TransactionHash, TransactionOutcome},
    BlockHeight,
};
use log::debug;
use tokio::time;

use crate::{node::LookupError, Gateway, GatewayError, GatewayResult};

impl Gateway {
    /// Resolves the execution outcome of `hash`, whichever of two sources
    /// settles first: the historical archive, or a live result event on the
    /// feed.
    ///
    /// A "not found" from the archive is not a failure; it only means no
    /// historical record exists yet, and the wait then rests on the live
    /// path alone. Any other archive error fails the wait immediately.
    /// Exactly one outcome is ever produced, and the losing source's
    /// registration is detached within the same step.
    pub async fn wait_for_transaction_result(
        &self,
        hash: TransactionHash,
    ) -> GatewayResult<TransactionOutcome> {
        // Fast path: the result was already observed on the feed.
        if let Some(outcome) = self.state.transactions.get(&hash) {
            return Ok(outcome);
        }

        // The live waiter is registered before the lookup is issued, so a
        // result landing between the two is caught by the registration.
        let mut live = self.state.subscriptions.wait_for_result(hash);

        let lookup = self.archive.fetch_transaction(hash);
        tokio::pin!(lookup);
        let mut no_record = false;

        let outcome = loop {
            let raced = tokio::select! {
                settled = &mut live.rx => {
                    Some(settled.map_err(|_| GatewayError::Shutdown))
                }
                looked_up = &mut lookup, if !no_record => match looked_up {
                    Ok(outcome) => Some(Ok(outcome)),
                    Err(LookupError::NotFound(_)) => {
                        no_record = true;
                        None
                    }
                    Err(err) => Some(Err(err.into())),
                }
            };
            if let Some(outcome) = raced {
                break outcome;
            }
        };
        live.detach();
        outcome
    }

    /// Settles once the chain reaches `target`.
    ///
    /// If the height cursor is already at or past the target this resolves
    /// synchronously, creating no registration. Exposed standalone for
    /// callers that only need a height barrier, e.g. confirmation-count
    /// waits.
    pub async fn wait_for_height(
        &self,
        target: BlockHeight,
    ) -> GatewayResult<BlockHeight> {
        let current = self.state.blocks.current();
        if current >= target {
            return Ok(current);
        }

        let mut barrier = self.state.subscriptions.wait_for_height(target);
        // The processor may have swept past the target between the check
        // above and the registration; re-reading the cursor closes that gap.
        let current = self.state.blocks.current();
        if current >= target {
            barrier.detach();
            return Ok(current);
        }

        let settled =
            (&mut barrier.rx).await.map_err(|_| GatewayError::Shutdown)?;
        barrier.detach();
        Ok(settled)
    }

    /// Settles with the height of the first observed block that includes
    /// `hash`.
    pub async fn wait_for_transaction_inclusion(
        &self,
        hash: TransactionHash,
    ) -> GatewayResult<BlockHeight> {
        if let Some(outcome) = self.state.transactions.get(&hash) {
            return Ok(outcome.height);
        }
        let mut waiter = self.state.subscriptions.wait_for_inclusion(hash);
        let settled =
            (&mut waiter.rx).await.map_err(|_| GatewayError::Shutdown)?;
        waiter.detach();
        Ok(settled)
    }

    /// The single entry point used by request handlers: resolves the
    /// outcome of `hash` and, for successful transactions, additionally
    /// waits until the proof window past its inclusion block has elapsed.
    ///
    /// Failed outcomes are returned as soon as they are known; they never
    /// need a proof. If the deadline fires first, every registration this
    /// wait created is detached before [`GatewayError::ProvabilityTimeout`]
    /// is returned, so a result arriving moments later settles nothing.
    pub async fn wait_for_transaction_to_be_provable(
        &self,
        hash: TransactionHash,
        deadline: Duration,
    ) -> GatewayResult<TransactionOutcome> {
        // On expiry the raced future is dropped right here, which runs the
        // detach handles of every registration it holds; cleanup is done
        // before the timeout error is even constructed.
        let raced =
            time::timeout(deadline, self.provable_outcome(hash)).await;
        match raced {
            Ok(result) => result,
            Err(_elapsed) => {
                debug!("transaction {hash} timed out after {deadline:?}");
                Err(GatewayError::ProvabilityTimeout { hash })
            }
        }
    }

    async fn provable_outcome(
        &self,
        hash: TransactionHash,
    ) -> GatewayResult<TransactionOutcome> {
        let outcome = self.wait_for_transaction_result(hash).await?;
        if let Err(failure) = &outcome.result {
            debug!(
                "transaction {hash} failed with code {}, skipping proof wait",
                failure.code
            );
            return Ok(outcome);
        }
        self.wait_for_height(outcome.height + self.proof_window).await?;
        Ok(outcome)
    }
}
