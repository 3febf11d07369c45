//! Payment gateway server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use payrail::config::AppConfig;
use payrail::gateway::banks::{BankService, HttpBankClient};
use payrail::gateway::history::HistoryStore;
use payrail::gateway::ledger::IdempotencyLedger;
use payrail::gateway::registry::UserRegistry;
use payrail::gateway::{self, AppState};
use payrail::logging::init_logging;

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "Payment gateway: authenticated RPC surface and 2PC coordinator")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/gateway.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pin the process-wide rustls provider; more than one may be linked in.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?;
    let _guard = init_logging(&config);

    info!(version = env!("GIT_HASH"), "Starting payment gateway");

    let registry = Arc::new(UserRegistry::load(PathBuf::from(
        &config.gateway.users_file,
    ))?);
    if !registry.is_empty() {
        info!(users = registry.len(), "Restored user registry");
    }

    let ledger = Arc::new(IdempotencyLedger::new());
    let history = Arc::new(HistoryStore::new(PathBuf::from(
        &config.gateway.history_file,
    )));
    let banks: Arc<dyn BankService> = Arc::new(HttpBankClient::new(Duration::from_secs(
        config.gateway.bank_call_timeout_secs,
    ))?);

    let state = Arc::new(AppState::new(registry, ledger, history, banks));
    gateway::run_server(state, &config).await
}
