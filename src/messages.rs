//! Wire and persisted message types shared by the gateway, the bank servers
//! and the client.
//!
//! Field names use camelCase on the wire and in the JSON files so that the
//! persisted artifacts (`transaction_history.json`, `pending_transactions.json`,
//! `accounts_*.json`) stay readable alongside the request payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Gateway surface
// ============================================================================

/// Payment transfer request.
///
/// The client mints `idempotency_key` (UUID v4) and `transaction_id`
/// (nanosecond timestamp string); both stay stable across retries, which is
/// what makes the offline queue safe to drain more than once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub transaction_id: String,
    pub sender_username: String,
    pub receiver_username: String,
    pub amount: Decimal,
    pub sender_bank: String,
    pub receiver_bank: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub bank_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnregisterRequest {
    pub username: String,
}

/// Outcome payload for register/unregister/pay calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceData {
    pub username: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryData {
    pub records: Vec<TransactionRecord>,
}

/// One committed transfer, as persisted in `transaction_history.json`.
///
/// `seq` is assigned under the history mutex and is strictly increasing, so
/// records stay totally ordered even when two commits share a second-granular
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub seq: u64,
    pub transaction_id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: Decimal,
    pub timestamp: String,
    pub message: String,
}

// ============================================================================
// Bank surface
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub transaction_id: String,
    pub account: String,
    pub amount: Decimal,
    /// Senders must cover `amount`; receivers only need to exist.
    pub is_sender: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareResponse {
    pub vote: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub transaction_id: String,
    pub account: String,
    pub amount: Decimal,
    pub is_sender: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortRequest {
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankBalanceResponse {
    pub balance: Decimal,
}

// ============================================================================
// Response envelope
// ============================================================================

/// Standard gateway response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            data: Some(data),
            msg: None,
        }
    }

    pub fn error(code: i32, msg: impl ToString) -> Self {
        Self {
            code,
            data: None,
            msg: Some(msg.to_string()),
        }
    }
}

/// Stable error codes carried in the envelope.
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = -1001;
    pub const PRECONDITION_FAILED: i32 = -1002;

    // Auth errors (4xxx)
    pub const UNAUTHENTICATED: i32 = -4001;
    pub const FORBIDDEN: i32 = -4003;
    pub const NOT_FOUND: i32 = -4040;

    // Server errors (5xxx / 6xxx)
    pub const SERVICE_UNAVAILABLE: i32 = -5001;
    pub const INTERNAL_ERROR: i32 = -5002;
    pub const TRANSACTION_ABORTED: i32 = -6001;
}
