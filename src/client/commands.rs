//! CLI command implementations.
//!
//! `pay` is the interesting one: it schedules a background drain of any
//! previously queued transfers, sends the fresh payment synchronously, and
//! turns a failed send into a queue insertion rather than a hard error.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api::GatewayClient;
use super::queue::OfflineQueue;
use crate::messages::{PaymentRequest, RegisterRequest};

/// Build a fresh payment request with a new idempotency key and a
/// time-based transaction id.
pub fn mint_payment(
    sender_username: &str,
    receiver_username: &str,
    amount: Decimal,
    sender_bank: &str,
    receiver_bank: &str,
) -> PaymentRequest {
    let now = Utc::now();
    let transaction_id = now
        .timestamp_nanos_opt()
        .map(|n| n.to_string())
        .unwrap_or_else(|| now.timestamp_millis().to_string());

    PaymentRequest {
        transaction_id,
        sender_username: sender_username.to_string(),
        receiver_username: receiver_username.to_string(),
        amount,
        sender_bank: sender_bank.to_string(),
        receiver_bank: receiver_bank.to_string(),
        idempotency_key: Uuid::new_v4().to_string(),
    }
}

pub async fn register(
    client: &GatewayClient,
    username: &str,
    password: &str,
    bank_address: &str,
) -> Result<()> {
    let status = client
        .register(&RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            bank_address: bank_address.to_string(),
        })
        .await?;
    println!("Registration response: {}", status.message);
    Ok(())
}

pub async fn unregister(client: &GatewayClient, username: &str) -> Result<()> {
    let status = client.unregister(username).await?;
    println!("Unregister response for user {username}: {}", status.message);
    Ok(())
}

pub async fn get_balance(client: &GatewayClient, username: &str) -> Result<()> {
    let balance = client.get_balance(username).await?;
    println!("Balance for user {username}: {balance}");
    Ok(())
}

pub async fn get_history(client: &GatewayClient, username: &str) -> Result<()> {
    let records = client.get_history(username).await?;
    println!("Transaction history for user {username}:");
    for rec in records {
        println!(
            "  #{} ID: {}, Sender: {}, Receiver: {}, Amount: {}, Time: {}, Msg: {}",
            rec.seq, rec.transaction_id, rec.sender, rec.receiver, rec.amount, rec.timestamp,
            rec.message
        );
    }
    Ok(())
}

/// Submit a payment, queueing it for retry when the gateway is unreachable.
///
/// Previously queued transfers are drained in a background task that the
/// command awaits before returning (a CLI process must not exit with the
/// drain mid-flight).
pub async fn pay(
    client: &GatewayClient,
    queue: Arc<OfflineQueue>,
    req: PaymentRequest,
) -> Result<()> {
    let drain = {
        let client = client.clone();
        let queue = queue.clone();
        tokio::spawn(async move { drain_queue(&client, &queue).await })
    };

    match client.process_payment(&req).await {
        Ok(status) => {
            println!("Payment response: {}", status.message);
        }
        Err(e) => {
            warn!(error = %e, transaction_id = %req.transaction_id, "Payment failed; queueing for retry");
            let transaction_id = req.transaction_id.clone();
            queue.push(req)?;
            println!("Payment could not be delivered; transaction {transaction_id} queued for retry.");
        }
    }

    let delivered = drain.await.unwrap_or(0);
    if delivered > 0 {
        println!("Delivered {delivered} previously queued transaction(s).");
    }
    Ok(())
}

/// Send every queued transfer once; successes (including "already
/// processed") leave the queue. Failures stay for the next invocation.
pub async fn drain_queue(client: &GatewayClient, queue: &OfflineQueue) -> usize {
    let pending = queue.snapshot();
    if pending.is_empty() {
        return 0;
    }

    info!(count = pending.len(), "Retrying queued transfers");
    let mut delivered = 0;
    for req in pending {
        match client.process_payment(&req).await {
            Ok(status) => {
                info!(
                    transaction_id = %req.transaction_id,
                    message = %status.message,
                    "Queued transfer delivered"
                );
                if queue.remove(&req.idempotency_key).unwrap_or(false) {
                    delivered += 1;
                }
            }
            Err(e) => {
                debug!(
                    transaction_id = %req.transaction_id,
                    error = %e,
                    "Queued transfer still undeliverable"
                );
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minted_payments_have_unique_keys() {
        let a = mint_payment("alice", "bob", dec!(1), "b1", "b2");
        let b = mint_payment("alice", "bob", dec!(1), "b1", "b2");
        assert_ne!(a.idempotency_key, b.idempotency_key);
        assert!(!a.transaction_id.is_empty());
        assert_eq!(a.amount, dec!(1));
    }
}
