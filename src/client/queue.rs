//! Durable offline queue of pending payment requests.
//!
//! A payment that cannot reach the gateway is appended here and retried on
//! later invocations. Each entry carries its own idempotency key, so a
//! transfer that was actually delivered (response lost) collapses into
//! "already processed" on retry. One mutex covers the foreground send and
//! the background drain; the file is rewritten under that same mutex.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::json_store;
use crate::messages::PaymentRequest;

pub const DEFAULT_QUEUE_FILE: &str = "pending_transactions.json";

pub struct OfflineQueue {
    path: PathBuf,
    entries: Mutex<Vec<PaymentRequest>>,
}

impl OfflineQueue {
    /// Load the queue file; a missing file is an empty queue.
    pub fn load(path: PathBuf) -> io::Result<Self> {
        let entries: Vec<PaymentRequest> = json_store::load_json(&path)?;
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Append a request and rewrite the file.
    pub fn push(&self, req: PaymentRequest) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.push(req);
        json_store::store_json(&self.path, &*entries)
    }

    /// Drop the entry with this idempotency key and rewrite the file.
    /// Returns false when no such entry existed (already drained).
    pub fn remove(&self, idempotency_key: &str) -> io::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.idempotency_key != idempotency_key);
        if entries.len() == before {
            return Ok(false);
        }
        json_store::store_json(&self.path, &*entries)?;
        Ok(true)
    }

    /// Copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<PaymentRequest> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(key: &str) -> PaymentRequest {
        PaymentRequest {
            transaction_id: format!("tx-{key}"),
            sender_username: "alice".to_string(),
            receiver_username: "bob".to_string(),
            amount: dec!(10),
            sender_bank: "127.0.0.1:50052".to_string(),
            receiver_bank: "127.0.0.1:50053".to_string(),
            idempotency_key: key.to_string(),
        }
    }

    #[test]
    fn push_and_remove_rewrite_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_QUEUE_FILE);

        let queue = OfflineQueue::load(path.clone()).unwrap();
        queue.push(request("k1")).unwrap();
        queue.push(request("k2")).unwrap();
        assert_eq!(queue.len(), 2);

        assert!(queue.remove("k1").unwrap());
        assert!(!queue.remove("k1").unwrap());
        assert_eq!(queue.len(), 1);

        let on_disk: Vec<PaymentRequest> = crate::json_store::load_json(&path).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk[0].idempotency_key, "k2");
    }

    #[test]
    fn queue_survives_restart_with_same_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_QUEUE_FILE);

        {
            let queue = OfflineQueue::load(path.clone()).unwrap();
            queue.push(request("k1")).unwrap();
            queue.push(request("k2")).unwrap();
        } // process "crashes"

        let reloaded = OfflineQueue::load(path).unwrap();
        let entries = reloaded.snapshot();
        assert_eq!(entries.len(), 2);
        // Idempotency keys are stable across the restart.
        assert_eq!(entries[0].idempotency_key, "k1");
        assert_eq!(entries[1].idempotency_key, "k2");
    }

    #[test]
    fn missing_file_is_an_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let queue = OfflineQueue::load(dir.path().join("absent.json")).unwrap();
        assert!(queue.is_empty());
    }
}
