//! Bank server: 2PC participant holding durable account balances.
//!
//! Listens plaintext; gateway and banks share a private network (the trust
//! assumption is the gateway's mTLS front door).

pub mod handlers;
pub mod store;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

pub use handlers::BankState;
pub use store::{Account, AccountStore};

pub fn router(state: Arc<BankState>) -> Router {
    Router::new()
        .route("/prepare", post(handlers::prepare))
        .route("/commit", post(handlers::commit))
        .route("/abort", post(handlers::abort))
        .route("/balance", get(handlers::get_balance))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn run_server(state: Arc<BankState>, addr: &str) -> anyhow::Result<()> {
    let bank_name = state.bank_name.clone();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(bank = %bank_name, addr = %addr, "Bank server started");
    axum::serve(listener, app).await?;
    Ok(())
}
