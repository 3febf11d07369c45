//! Payment coordinator.
//!
//! Drives the two-phase commit across the sender and receiver banks, guarded
//! by the idempotency ledger. Prepare and commit both go to the sender
//! first: the sender is the side that must cover the funds, so its refusal
//! is the cheapest place to stop.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use super::banks::{BankCallError, BankService};
use super::error::GatewayError;
use super::history::HistoryStore;
use super::ledger::{ClaimResult, IdempotencyLedger, TxOutcome};
use super::registry::UserRegistry;
use crate::messages::{
    AbortRequest, CommitRequest, PaymentRequest, PrepareRequest, TransactionStatus,
};

const COMMIT_MESSAGE: &str = "Transaction committed successfully";

pub struct PaymentCoordinator {
    registry: Arc<UserRegistry>,
    ledger: Arc<IdempotencyLedger>,
    history: Arc<HistoryStore>,
    banks: Arc<dyn BankService>,
}

impl PaymentCoordinator {
    pub fn new(
        registry: Arc<UserRegistry>,
        ledger: Arc<IdempotencyLedger>,
        history: Arc<HistoryStore>,
        banks: Arc<dyn BankService>,
    ) -> Self {
        Self {
            registry,
            ledger,
            history,
            banks,
        }
    }

    /// Process one payment request end to end.
    ///
    /// Precondition checks run in a fixed order: registration, idempotency
    /// key, amount. A key that already has an entry short-circuits without
    /// side effects; otherwise the key is claimed as pending and 2PC runs.
    pub async fn process(&self, req: &PaymentRequest) -> Result<TransactionStatus, GatewayError> {
        if !self.registry.contains(&req.sender_username)
            || !self.registry.contains(&req.receiver_username)
        {
            return Err(GatewayError::PreconditionFailed(
                "One or both users are not registered".to_string(),
            ));
        }

        if req.idempotency_key.is_empty() {
            return Err(GatewayError::InvalidArgument(
                "idempotencyKey must be provided".to_string(),
            ));
        }

        if req.amount <= Decimal::ZERO {
            return Err(GatewayError::InvalidArgument(
                "amount must be greater than zero".to_string(),
            ));
        }

        match self.ledger.claim(&req.idempotency_key) {
            ClaimResult::AlreadyExists(outcome) => {
                info!(
                    idempotency_key = %req.idempotency_key,
                    outcome = %outcome,
                    "Duplicate request short-circuited"
                );
                return Ok(TransactionStatus {
                    success: true,
                    message: format!("Transaction already processed: {outcome}"),
                });
            }
            ClaimResult::Claimed => {}
        }

        info!(
            idempotency_key = %req.idempotency_key,
            transaction_id = %req.transaction_id,
            sender = %req.sender_username,
            receiver = %req.receiver_username,
            amount = %req.amount,
            "Processing transaction"
        );

        match self.run_two_phase(req).await {
            Ok(()) => {
                self.ledger.finish(&req.idempotency_key, TxOutcome::Committed);
                if let Err(e) = self.history.append(
                    &req.transaction_id,
                    &req.sender_username,
                    &req.receiver_username,
                    req.amount,
                    COMMIT_MESSAGE,
                ) {
                    // The transfer is committed at both banks; a history
                    // write failure must not turn it into an error.
                    error!(
                        transaction_id = %req.transaction_id,
                        error = %e,
                        "Failed to append transaction history"
                    );
                }
                Ok(TransactionStatus {
                    success: true,
                    message: COMMIT_MESSAGE.to_string(),
                })
            }
            Err(e) => {
                self.ledger.finish(&req.idempotency_key, TxOutcome::Aborted);
                Err(e)
            }
        }
    }

    async fn run_two_phase(&self, req: &PaymentRequest) -> Result<(), GatewayError> {
        let tx_id = &req.transaction_id;

        // Phase 1: prepare on sender.
        let sender_prepare = PrepareRequest {
            transaction_id: tx_id.clone(),
            account: req.sender_username.clone(),
            amount: req.amount,
            is_sender: true,
        };
        match self.banks.prepare(&req.sender_bank, &sender_prepare).await {
            Ok(resp) if resp.vote => {}
            Ok(resp) => {
                info!(transaction_id = %tx_id, reason = %resp.message, "Sender bank voted no");
                return Err(GatewayError::Aborted(
                    "Sender bank aborted the transaction".to_string(),
                ));
            }
            Err(BankCallError::Unreachable(e)) => {
                return Err(GatewayError::PreconditionFailed(format!(
                    "Error connecting to sender bank: {e}"
                )));
            }
            Err(e) => {
                warn!(transaction_id = %tx_id, error = %e, "Sender prepare failed");
                return Err(GatewayError::Aborted(
                    "Sender bank aborted the transaction".to_string(),
                ));
            }
        }

        // Phase 1: prepare on receiver.
        let receiver_prepare = PrepareRequest {
            transaction_id: tx_id.clone(),
            account: req.receiver_username.clone(),
            amount: req.amount,
            is_sender: false,
        };
        match self
            .banks
            .prepare(&req.receiver_bank, &receiver_prepare)
            .await
        {
            Ok(resp) if resp.vote => {}
            outcome => {
                match outcome {
                    Ok(resp) => {
                        info!(transaction_id = %tx_id, reason = %resp.message, "Receiver bank voted no")
                    }
                    Err(e) => {
                        warn!(transaction_id = %tx_id, error = %e, "Receiver prepare failed")
                    }
                }
                // Best-effort abort on the sender side; its outcome does not
                // change ours.
                let abort = AbortRequest {
                    transaction_id: tx_id.clone(),
                };
                if let Err(e) = self.banks.abort(&req.sender_bank, &abort).await {
                    warn!(transaction_id = %tx_id, error = %e, "Sender abort failed");
                }
                return Err(GatewayError::Aborted(
                    "Receiver bank aborted the transaction".to_string(),
                ));
            }
        }

        // Phase 2: commit on sender (debit).
        let sender_commit = CommitRequest {
            transaction_id: tx_id.clone(),
            account: req.sender_username.clone(),
            amount: req.amount,
            is_sender: true,
        };
        match self.banks.commit(&req.sender_bank, &sender_commit).await {
            Ok(resp) if resp.success => {}
            outcome => {
                match outcome {
                    Ok(resp) => {
                        warn!(transaction_id = %tx_id, reason = %resp.message, "Sender commit refused")
                    }
                    Err(e) => warn!(transaction_id = %tx_id, error = %e, "Sender commit failed"),
                }
                return Err(GatewayError::Aborted(
                    "Sender bank commit failed".to_string(),
                ));
            }
        }

        // Phase 2: commit on receiver (credit).
        let receiver_commit = CommitRequest {
            transaction_id: tx_id.clone(),
            account: req.receiver_username.clone(),
            amount: req.amount,
            is_sender: false,
        };
        match self
            .banks
            .commit(&req.receiver_bank, &receiver_commit)
            .await
        {
            Ok(resp) if resp.success => Ok(()),
            outcome => {
                match outcome {
                    Ok(resp) => {
                        error!(transaction_id = %tx_id, reason = %resp.message, "Receiver commit refused after sender debit")
                    }
                    Err(e) => {
                        error!(transaction_id = %tx_id, error = %e, "Receiver commit failed after sender debit")
                    }
                }
                self.compensate_sender(req).await;
                Err(GatewayError::Aborted(
                    "Receiver bank commit failed".to_string(),
                ))
            }
        }
    }

    /// Credit the already-debited sender back. Best-effort: a failure here
    /// leaves the debit in place and is loudly logged for manual repair.
    async fn compensate_sender(&self, req: &PaymentRequest) {
        let credit = CommitRequest {
            transaction_id: req.transaction_id.clone(),
            account: req.sender_username.clone(),
            amount: req.amount,
            is_sender: false,
        };
        match self.banks.commit(&req.sender_bank, &credit).await {
            Ok(resp) if resp.success => {
                info!(
                    transaction_id = %req.transaction_id,
                    account = %req.sender_username,
                    "Compensating credit applied to sender"
                );
            }
            Ok(resp) => {
                error!(
                    transaction_id = %req.transaction_id,
                    reason = %resp.message,
                    "Compensating credit refused; sender remains debited"
                );
            }
            Err(e) => {
                error!(
                    transaction_id = %req.transaction_id,
                    error = %e,
                    "Compensating credit failed; sender remains debited"
                );
            }
        }
    }
}
