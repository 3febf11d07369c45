//! Idempotency ledger.
//!
//! Tracks the outcome of every payment the gateway has seen, keyed by the
//! client-minted idempotency key. Replays of a terminal key short-circuit
//! without touching the banks; that is the whole retry-safety story for the
//! client's offline queue.

use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Per-key outcome state machine:
///
/// ```text
/// (absent) ──first request──▶ Pending
/// Pending  ──both commits ok──▶ Committed
/// Pending  ──any failure    ──▶ Aborted
/// Committed / Aborted : terminal; replays short-circuit
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Pending,
    Committed,
    Aborted,
}

impl TxOutcome {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxOutcome::Committed | TxOutcome::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxOutcome::Pending => "pending",
            TxOutcome::Committed => "committed",
            TxOutcome::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TxOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of attempting to claim a key for processing.
#[derive(Debug, PartialEq, Eq)]
pub enum ClaimResult {
    /// Key was absent; it is now marked `Pending` and the caller owns it.
    Claimed,
    /// Key already present with the given outcome; the caller must not
    /// re-execute.
    AlreadyExists(TxOutcome),
}

#[derive(Default)]
pub struct IdempotencyLedger {
    entries: DashMap<String, TxOutcome>,
}

impl IdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-writer-wins claim. Exactly one caller per key ever gets
    /// `Claimed`; concurrent duplicates observe the existing entry.
    pub fn claim(&self, key: &str) -> ClaimResult {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => ClaimResult::AlreadyExists(*occupied.get()),
            Entry::Vacant(vacant) => {
                vacant.insert(TxOutcome::Pending);
                ClaimResult::Claimed
            }
        }
    }

    /// Record the terminal outcome for a claimed key.
    pub fn finish(&self, key: &str, outcome: TxOutcome) {
        debug_assert!(outcome.is_terminal());
        self.entries.insert(key.to_string(), outcome);
    }

    pub fn get(&self, key: &str) -> Option<TxOutcome> {
        self.entries.get(key).map(|e| *e.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_claim_wins() {
        let ledger = IdempotencyLedger::new();
        assert_eq!(ledger.claim("k1"), ClaimResult::Claimed);
        assert_eq!(
            ledger.claim("k1"),
            ClaimResult::AlreadyExists(TxOutcome::Pending)
        );
    }

    #[test]
    fn terminal_outcome_is_observed_by_replays() {
        let ledger = IdempotencyLedger::new();
        assert_eq!(ledger.claim("k1"), ClaimResult::Claimed);
        ledger.finish("k1", TxOutcome::Committed);
        assert_eq!(
            ledger.claim("k1"),
            ClaimResult::AlreadyExists(TxOutcome::Committed)
        );

        assert_eq!(ledger.claim("k2"), ClaimResult::Claimed);
        ledger.finish("k2", TxOutcome::Aborted);
        assert_eq!(
            ledger.claim("k2"),
            ClaimResult::AlreadyExists(TxOutcome::Aborted)
        );
    }

    #[test]
    fn concurrent_claims_yield_exactly_one_owner() {
        use std::sync::Arc;

        let ledger = Arc::new(IdempotencyLedger::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                matches!(ledger.claim("shared"), ClaimResult::Claimed)
            }));
        }

        let owners = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|claimed| *claimed)
            .count();
        assert_eq!(owners, 1);
    }
}
