//! Payment gateway: authenticated RPC surface and 2PC transaction
//! coordinator.

pub mod auth;
pub mod banks;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod history;
pub mod ledger;
pub mod registry;
pub mod state;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
pub use state::AppState;

/// Build the gateway router with the full middleware chain.
///
/// Layer order (outermost first): credential auth → self-only authorization
/// → request logging → handler.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/unregister", post(handlers::unregister))
        .route("/balance", get(handlers::get_balance))
        .route("/history", get(handlers::get_history))
        .route("/payments", post(handlers::process_payment))
        .layer(middleware::from_fn(auth::request_logging))
        .layer(middleware::from_fn(auth::self_only_reads))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::credential_auth,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the gateway behind mutual TLS until the process is stopped.
pub async fn run_server(state: Arc<AppState>, config: &AppConfig) -> Result<()> {
    let tls = crate::tls::server_config(&config.tls)?;
    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
        .parse()
        .context("invalid gateway listen address")?;

    let rustls_config = RustlsConfig::from_config(Arc::new(tls));

    info!(addr = %addr, "Secure payment gateway started");
    axum_server::bind_rustls(addr, rustls_config)
        .serve(router(state).into_make_service())
        .await
        .context("gateway server failed")
}
