//! Gateway RPC handlers.
//!
//! Authentication and authorization have already run by the time these
//! execute; handlers only do the work of their method.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::banks::BankCallError;
use super::error::GatewayError;
use super::registry::RegisteredUser;
use super::state::AppState;
use crate::messages::{
    ApiResponse, BalanceData, HistoryData, PaymentRequest, RegisterRequest, TransactionStatus,
    UnregisterRequest,
};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>, GatewayError> {
    info!(username = %req.username, bank = %req.bank_address, "Registering user");
    state.registry.register(
        &req.username,
        RegisteredUser {
            password: req.password,
            bank_address: req.bank_address,
        },
    )?;
    Ok(Json(ApiResponse::success(TransactionStatus {
        success: true,
        message: "User registered successfully".to_string(),
    })))
}

pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UnregisterRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>, GatewayError> {
    let removed = state.registry.unregister(&req.username)?;
    let status = if removed {
        info!(username = %req.username, "User unregistered");
        TransactionStatus {
            success: true,
            message: "User unregistered successfully".to_string(),
        }
    } else {
        TransactionStatus {
            success: false,
            message: "User not registered".to_string(),
        }
    };
    Ok(Json(ApiResponse::success(status)))
}

#[derive(Debug, Deserialize)]
pub struct UserParams {
    pub username: String,
}

/// Proxy the balance read to the user's registered bank.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<ApiResponse<BalanceData>>, GatewayError> {
    info!(username = %params.username, "GetBalance called");
    let user = state
        .registry
        .get(&params.username)
        .ok_or(GatewayError::UserNotRegistered)?;

    let balance = state
        .banks
        .get_balance(&user.bank_address, &params.username)
        .await
        .map_err(|e| match e {
            BankCallError::NotFound => GatewayError::NotFound("account not found".to_string()),
            BankCallError::Unreachable(e) => GatewayError::PreconditionFailed(format!(
                "failed to connect to bank server: {e}"
            )),
            BankCallError::Failed(e) => {
                GatewayError::Internal(format!("error from bank server: {e}"))
            }
        })?;

    Ok(Json(ApiResponse::success(BalanceData {
        username: params.username,
        balance,
    })))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserParams>,
) -> Result<Json<ApiResponse<HistoryData>>, GatewayError> {
    info!(username = %params.username, "GetTransactionHistory called");
    let records = state.history.records_for_user(&params.username)?;
    Ok(Json(ApiResponse::success(HistoryData { records })))
}

pub async fn process_payment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>, GatewayError> {
    let status = state.coordinator.process(&req).await?;
    Ok(Json(ApiResponse::success(status)))
}
