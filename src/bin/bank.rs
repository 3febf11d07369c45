//! Bank server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use payrail::bank::{self, AccountStore, BankState};
use payrail::config::AppConfig;
use payrail::logging::init_logging;

#[derive(Parser)]
#[command(name = "bank")]
#[command(about = "Bank server: 2PC participant with durable balances")]
struct Cli {
    /// Bank name, used in logs
    bank_name: String,

    /// Accounts JSON file (must exist)
    accounts_file: PathBuf,

    /// Listen port
    #[arg(default_value_t = 50052)]
    port: u16,

    /// Seconds to wait before acknowledging an abort. A knob for probing
    /// how the coordinator behaves when abort responses are slow.
    #[arg(long, default_value_t = 5)]
    abort_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig {
        log_file: format!("{}.log", cli.bank_name),
        ..AppConfig::default()
    };
    let _guard = init_logging(&config);

    let store = AccountStore::load(cli.accounts_file.clone())
        .with_context(|| format!("error loading accounts from {}", cli.accounts_file.display()))?;
    info!(
        bank = %cli.bank_name,
        accounts = store.len(),
        abort_timeout_secs = cli.abort_timeout,
        "Loaded account book"
    );

    let state = Arc::new(BankState::new(
        cli.bank_name,
        store,
        Duration::from_secs(cli.abort_timeout),
    ));

    let addr = format!("0.0.0.0:{}", cli.port);
    bank::run_server(state, &addr).await
}
