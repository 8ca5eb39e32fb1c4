//! Waiting for block inclusion.
//!
//! After submission three sources race: the status stream, the error stream
//! and a deadline. The first terminal signal wins and the whole subscription
//! is dropped before returning, whichever branch fired.
//!
//! Inclusion in a block (not finality) ends the wait. A block that is later
//! reorganised away is not detected.

use std::time::Duration;

use futures::StreamExt;
use tracing::{trace, warn};

use super::chain::{TxStatus, TxWatch};
use crate::error::ChainError;
use crate::types::{BlockHash, TxHash};

/// Terminal result of watching one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The extrinsic is in this block.
    Included(BlockHash),
    /// The node or the transport reported a failure before inclusion.
    SubmissionError(ChainError),
    /// The deadline passed first. The extrinsic may still be included later.
    TimedOut,
}

/// Wait until `watch` reports inclusion, an error, or `timeout` elapses.
pub(crate) async fn await_inclusion(
    watch: TxWatch,
    timeout: Duration,
    tx_hash: TxHash,
) -> ConfirmationOutcome {
    let TxWatch {
        mut statuses,
        mut errors,
        guard,
    } = watch;

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let outcome = loop {
        tokio::select! {
            biased;

            status = statuses.next() => {
                let Some(status) = status else {
                    break ConfirmationOutcome::SubmissionError(ChainError::SubscriptionClosed);
                };
                trace!(tx_hash = %tx_hash, status = ?status, "Transaction status");
                match status {
                    TxStatus::InBlock(block) | TxStatus::Finalized(block) => {
                        break ConfirmationOutcome::Included(block);
                    }
                    TxStatus::Invalid => {
                        break rejected("transaction is invalid");
                    }
                    TxStatus::Dropped => {
                        break rejected("transaction dropped from the pool");
                    }
                    TxStatus::Usurped(by) => {
                        break rejected(&format!("transaction usurped by {by}"));
                    }
                    TxStatus::Future
                    | TxStatus::Ready
                    | TxStatus::Broadcast(_)
                    | TxStatus::Retracted(_)
                    | TxStatus::FinalityTimeout(_) => {}
                }
            }

            Some(err) = errors.next() => {
                break ConfirmationOutcome::SubmissionError(err);
            }

            () = &mut deadline => {
                warn!(tx_hash = %tx_hash, timeout = ?timeout, "Timed out waiting for inclusion");
                break ConfirmationOutcome::TimedOut;
            }
        }
    };

    drop(statuses);
    drop(errors);
    drop(guard);
    outcome
}

fn rejected(reason: &str) -> ConfirmationOutcome {
    ConfirmationOutcome::SubmissionError(ChainError::Rejected(reason.to_string()))
}
