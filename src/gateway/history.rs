//! Durable transaction history.
//!
//! A single JSON array file, appended exactly once per committed transfer.
//! Append is a mutex-guarded critical section that reads, decodes, mutates,
//! encodes and atomically rewrites the whole file. Each record gets a
//! monotonic `seq` so ordering survives the second-granularity timestamps.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::json_store;
use crate::messages::TransactionRecord;

pub struct HistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append one committed-transfer record and return it.
    pub fn append(
        &self,
        transaction_id: &str,
        sender: &str,
        receiver: &str,
        amount: Decimal,
        message: &str,
    ) -> io::Result<TransactionRecord> {
        let _guard = self.lock.lock().unwrap();

        let mut records: Vec<TransactionRecord> = json_store::load_json(&self.path)?;
        let seq = records.last().map(|r| r.seq + 1).unwrap_or(1);

        let record = TransactionRecord {
            seq,
            transaction_id: transaction_id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message: message.to_string(),
        };
        records.push(record.clone());

        json_store::store_json(&self.path, &records)?;
        Ok(record)
    }

    /// All records where the user is sender or receiver, in append order.
    pub fn records_for_user(&self, username: &str) -> io::Result<Vec<TransactionRecord>> {
        let _guard = self.lock.lock().unwrap();
        let records: Vec<TransactionRecord> = json_store::load_json(&self.path)?;
        Ok(records
            .into_iter()
            .filter(|r| r.sender == username || r.receiver == username)
            .collect())
    }

    /// Total record count (test and diagnostics helper).
    pub fn len(&self) -> io::Result<usize> {
        let _guard = self.lock.lock().unwrap();
        let records: Vec<TransactionRecord> = json_store::load_json(&self.path)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn append_assigns_increasing_seq() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(dir.path().join("history.json"));

        let r1 = history
            .append("tx-1", "alice", "bob", dec!(40), "ok")
            .unwrap();
        let r2 = history
            .append("tx-2", "bob", "alice", dec!(10), "ok")
            .unwrap();

        assert_eq!(r1.seq, 1);
        assert_eq!(r2.seq, 2);
        assert_eq!(history.len().unwrap(), 2);
    }

    #[test]
    fn records_filtered_by_participant() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(dir.path().join("history.json"));

        history
            .append("tx-1", "alice", "bob", dec!(40), "ok")
            .unwrap();
        history
            .append("tx-2", "carol", "dave", dec!(5), "ok")
            .unwrap();

        let for_alice = history.records_for_user("alice").unwrap();
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].transaction_id, "tx-1");

        let for_bob = history.records_for_user("bob").unwrap();
        assert_eq!(for_bob.len(), 1);

        assert!(history.records_for_user("erin").unwrap().is_empty());
    }

    #[test]
    fn history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        {
            let history = HistoryStore::new(path.clone());
            history
                .append("tx-1", "alice", "bob", dec!(40), "ok")
                .unwrap();
        }

        let reopened = HistoryStore::new(path);
        let records = reopened.records_for_user("alice").unwrap();
        assert_eq!(records.len(), 1);
        // seq continues after the last persisted record
        let next = reopened
            .append("tx-2", "alice", "bob", dec!(1), "ok")
            .unwrap();
        assert_eq!(next.seq, 2);
    }

    #[test]
    fn timestamp_has_second_granularity() {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(dir.path().join("history.json"));
        let record = history
            .append("tx-1", "alice", "bob", dec!(40), "ok")
            .unwrap();
        // RFC-3339, no fractional seconds: 2026-01-01T00:00:00Z
        assert!(record.timestamp.ends_with('Z'));
        assert!(!record.timestamp.contains('.'));
    }
}
