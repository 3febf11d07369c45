//! Bank participant handlers: prepare / commit / abort / balance.
//!
//! A single mutex serializes all balance operations and the persistence
//! rewrite, so no two transactions progress concurrently within one bank.
//! `abort` deliberately sleeps outside that mutex.

use std::sync::Mutex;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::store::AccountStore;
use crate::messages::{
    AbortRequest, AbortResponse, BankBalanceResponse, CommitRequest, CommitResponse,
    PrepareRequest, PrepareResponse,
};

pub struct BankState {
    pub bank_name: String,
    pub store: Mutex<AccountStore>,
    /// How long `abort` waits before acknowledging. A test knob for probing
    /// coordinator behavior when abort responses are slow.
    pub abort_timeout: Duration,
}

impl BankState {
    pub fn new(bank_name: String, store: AccountStore, abort_timeout: Duration) -> Self {
        Self {
            bank_name,
            store: Mutex::new(store),
            abort_timeout,
        }
    }
}

/// Feasibility vote. Does not reserve funds; the sender commit re-checks.
///
/// Only the debiting side needs funds to cover the amount; the crediting
/// side just has to exist.
pub async fn prepare(
    State(state): State<Arc<BankState>>,
    Json(req): Json<PrepareRequest>,
) -> Json<PrepareResponse> {
    let store = state.store.lock().unwrap();

    let balance = match store.balance(&req.account) {
        Some(balance) => balance,
        None => {
            return Json(PrepareResponse {
                vote: false,
                message: "Account not found".to_string(),
            });
        }
    };

    if req.is_sender && balance < req.amount {
        return Json(PrepareResponse {
            vote: false,
            message: "Insufficient funds".to_string(),
        });
    }

    info!(
        bank = %state.bank_name,
        transaction_id = %req.transaction_id,
        account = %req.account,
        "Prepared transaction"
    );
    Json(PrepareResponse {
        vote: true,
        message: "Prepared successfully".to_string(),
    })
}

/// Apply the debit or credit and persist the account book.
///
/// The sender side re-checks the balance because prepare reserved nothing.
/// If the file rewrite fails the in-memory change is reverted so memory and
/// disk never diverge.
pub async fn commit(
    State(state): State<Arc<BankState>>,
    Json(req): Json<CommitRequest>,
) -> Json<CommitResponse> {
    let mut store = state.store.lock().unwrap();

    let balance = match store.balance(&req.account) {
        Some(balance) => balance,
        None => {
            return Json(CommitResponse {
                success: false,
                message: "Account not found".to_string(),
            });
        }
    };

    let new_balance = if req.is_sender {
        if balance < req.amount {
            return Json(CommitResponse {
                success: false,
                message: "Insufficient funds on commit".to_string(),
            });
        }
        balance - req.amount
    } else {
        balance + req.amount
    };

    store.set_balance(&req.account, new_balance);

    if let Err(e) = store.persist() {
        warn!(
            bank = %state.bank_name,
            transaction_id = %req.transaction_id,
            error = %e,
            "Failed to persist accounts, reverting commit"
        );
        store.set_balance(&req.account, balance);
        return Json(CommitResponse {
            success: false,
            message: "Failed to persist balances".to_string(),
        });
    }

    info!(
        bank = %state.bank_name,
        transaction_id = %req.transaction_id,
        account = %req.account,
        new_balance = %new_balance,
        credited = !req.is_sender,
        "Committed transaction"
    );
    Json(CommitResponse {
        success: true,
        message: "Commit successful".to_string(),
    })
}

/// Acknowledge an abort after the configured delay.
///
/// No state is mutated (prepare reserved nothing, so there is nothing to
/// undo). The sleep happens without the store mutex; if the caller hangs up
/// first, the dropped connection cancels the wait.
pub async fn abort(
    State(state): State<Arc<BankState>>,
    Json(req): Json<AbortRequest>,
) -> Json<AbortResponse> {
    info!(
        bank = %state.bank_name,
        transaction_id = %req.transaction_id,
        "Initiating abort"
    );

    tokio::time::sleep(state.abort_timeout).await;

    info!(
        bank = %state.bank_name,
        transaction_id = %req.transaction_id,
        timeout_secs = state.abort_timeout.as_secs_f64(),
        "Aborted transaction after timeout"
    );
    Json(AbortResponse {
        success: true,
        message: "Abort processed after timeout".to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct BalanceParams {
    pub username: String,
}

pub async fn get_balance(
    State(state): State<Arc<BankState>>,
    Query(params): Query<BalanceParams>,
) -> Result<Json<BankBalanceResponse>, (StatusCode, String)> {
    let store = state.store.lock().unwrap();
    let balance: Decimal = store
        .balance(&params.username)
        .ok_or((StatusCode::NOT_FOUND, "account not found".to_string()))?;

    info!(
        bank = %state.bank_name,
        account = %params.username,
        balance = %balance,
        "Returning balance"
    );
    Ok(Json(BankBalanceResponse { balance }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::store::Account;
    use rust_decimal_macros::dec;

    fn test_state(abort_timeout: Duration) -> (Arc<BankState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let accounts = vec![
            Account {
                username: "alice".to_string(),
                password: "pw-a".to_string(),
                balance: dec!(100),
            },
            Account {
                username: "bob".to_string(),
                password: "pw-b".to_string(),
                balance: dec!(0),
            },
        ];
        crate::json_store::store_json(&path, &accounts).unwrap();
        let store = AccountStore::load(path).unwrap();
        let state = Arc::new(BankState::new("TestBank".to_string(), store, abort_timeout));
        (state, dir)
    }

    fn prepare_req(account: &str, amount: Decimal, is_sender: bool) -> PrepareRequest {
        PrepareRequest {
            transaction_id: "tx-1".to_string(),
            account: account.to_string(),
            amount,
            is_sender,
        }
    }

    fn commit_req(account: &str, amount: Decimal, is_sender: bool) -> CommitRequest {
        CommitRequest {
            transaction_id: "tx-1".to_string(),
            account: account.to_string(),
            amount,
            is_sender,
        }
    }

    #[tokio::test]
    async fn prepare_votes_yes_when_funds_cover() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        let Json(resp) = prepare(State(state), Json(prepare_req("alice", dec!(40), true))).await;
        assert!(resp.vote);
    }

    #[tokio::test]
    async fn prepare_votes_no_on_missing_account_or_shortfall() {
        let (state, _dir) = test_state(Duration::from_millis(1));

        let Json(resp) = prepare(
            State(state.clone()),
            Json(prepare_req("carol", dec!(1), false)),
        )
        .await;
        assert!(!resp.vote);
        assert_eq!(resp.message, "Account not found");

        let Json(resp) = prepare(State(state), Json(prepare_req("alice", dec!(200), true))).await;
        assert!(!resp.vote);
        assert_eq!(resp.message, "Insufficient funds");
    }

    #[tokio::test]
    async fn receiving_side_needs_no_funds() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        // bob holds 0; crediting him 40 is still feasible
        let Json(resp) = prepare(State(state), Json(prepare_req("bob", dec!(40), false))).await;
        assert!(resp.vote);
    }

    #[tokio::test]
    async fn prepare_does_not_reserve_funds() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        let Json(first) = prepare(
            State(state.clone()),
            Json(prepare_req("alice", dec!(100), true)),
        )
        .await;
        let Json(second) = prepare(
            State(state.clone()),
            Json(prepare_req("alice", dec!(100), true)),
        )
        .await;
        assert!(first.vote && second.vote);
        assert_eq!(
            state.store.lock().unwrap().balance("alice"),
            Some(dec!(100))
        );
    }

    #[tokio::test]
    async fn commit_debits_sender_and_persists() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        let Json(resp) = commit(
            State(state.clone()),
            Json(commit_req("alice", dec!(40), true)),
        )
        .await;
        assert!(resp.success);
        assert_eq!(state.store.lock().unwrap().balance("alice"), Some(dec!(60)));
    }

    #[tokio::test]
    async fn commit_credits_receiver_without_balance_check() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        let Json(resp) = commit(
            State(state.clone()),
            Json(commit_req("bob", dec!(40), false)),
        )
        .await;
        assert!(resp.success);
        assert_eq!(state.store.lock().unwrap().balance("bob"), Some(dec!(40)));
    }

    #[tokio::test]
    async fn sender_commit_rechecks_balance() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        let Json(resp) = commit(
            State(state.clone()),
            Json(commit_req("alice", dec!(200), true)),
        )
        .await;
        assert!(!resp.success);
        assert_eq!(resp.message, "Insufficient funds on commit");
        assert_eq!(
            state.store.lock().unwrap().balance("alice"),
            Some(dec!(100))
        );
    }

    #[tokio::test]
    async fn abort_waits_for_configured_timeout() {
        let (state, _dir) = test_state(Duration::from_millis(80));
        let started = std::time::Instant::now();
        let Json(resp) = abort(
            State(state),
            Json(AbortRequest {
                transaction_id: "tx-1".to_string(),
            }),
        )
        .await;
        assert!(resp.success);
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn get_balance_misses_with_not_found() {
        let (state, _dir) = test_state(Duration::from_millis(1));
        let res = get_balance(
            State(state),
            Query(BalanceParams {
                username: "carol".to_string(),
            }),
        )
        .await;
        assert_eq!(res.err().map(|(code, _)| code), Some(StatusCode::NOT_FOUND));
    }
}
