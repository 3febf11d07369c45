//! Payments client binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use payrail::client::{commands, GatewayClient, OfflineQueue, DEFAULT_QUEUE_FILE};
use payrail::config::TlsConfig;
use payrail::tls;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Payments client with offline queueing")]
struct Cli {
    /// Directory holding client.crt, client.key and ca.crt
    #[arg(long, default_value = "./certs")]
    cert_dir: String,

    /// Password sent with authenticated calls
    #[arg(long, default_value = "secret")]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a user with the gateway
    Register {
        gateway_address: String,
        username: String,
        password: String,
        bank_address: String,
    },
    /// Transfer money; undeliverable payments are queued for retry
    Pay {
        gateway_address: String,
        sender_bank: String,
        receiver_bank: String,
        sender_username: String,
        receiver_username: String,
        amount: Decimal,
    },
    /// Show the user's balance
    Getbalance {
        gateway_address: String,
        username: String,
    },
    /// Show the user's transaction history
    Gethistory {
        gateway_address: String,
        username: String,
    },
    /// Remove a user from the gateway registry
    Unregister {
        gateway_address: String,
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pin the process-wide rustls provider; more than one may be linked in.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let tls_config = TlsConfig {
        cert_dir: cli.cert_dir.clone(),
    };
    let material = tls::client_material(&tls_config)?;

    match cli.command {
        Command::Register {
            gateway_address,
            username,
            password,
            bank_address,
        } => {
            let client = GatewayClient::new(&gateway_address, &username, &password, &material)?;
            commands::register(&client, &username, &password, &bank_address).await
        }
        Command::Pay {
            gateway_address,
            sender_bank,
            receiver_bank,
            sender_username,
            receiver_username,
            amount,
        } => {
            let client = GatewayClient::new(
                &gateway_address,
                &sender_username,
                &cli.password,
                &material,
            )?;
            let queue = Arc::new(OfflineQueue::load(PathBuf::from(DEFAULT_QUEUE_FILE))?);
            let req = commands::mint_payment(
                &sender_username,
                &receiver_username,
                amount,
                &sender_bank,
                &receiver_bank,
            );
            commands::pay(&client, queue, req).await
        }
        Command::Getbalance {
            gateway_address,
            username,
        } => {
            let client =
                GatewayClient::new(&gateway_address, &username, &cli.password, &material)?;
            commands::get_balance(&client, &username).await
        }
        Command::Gethistory {
            gateway_address,
            username,
        } => {
            let client =
                GatewayClient::new(&gateway_address, &username, &cli.password, &material)?;
            commands::get_history(&client, &username).await
        }
        Command::Unregister {
            gateway_address,
            username,
        } => {
            let client =
                GatewayClient::new(&gateway_address, &username, &cli.password, &material)?;
            commands::unregister(&client, &username).await
        }
    }
}
