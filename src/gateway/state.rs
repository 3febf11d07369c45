//! Shared gateway state.
//!
//! Everything the handlers touch is owned here and injected into the router;
//! lifecycle is server start to server stop. There are no process globals.

use std::sync::Arc;

use super::banks::BankService;
use super::coordinator::PaymentCoordinator;
use super::history::HistoryStore;
use super::ledger::IdempotencyLedger;
use super::registry::UserRegistry;

pub struct AppState {
    pub registry: Arc<UserRegistry>,
    pub ledger: Arc<IdempotencyLedger>,
    pub history: Arc<HistoryStore>,
    pub banks: Arc<dyn BankService>,
    pub coordinator: PaymentCoordinator,
}

impl AppState {
    pub fn new(
        registry: Arc<UserRegistry>,
        ledger: Arc<IdempotencyLedger>,
        history: Arc<HistoryStore>,
        banks: Arc<dyn BankService>,
    ) -> Self {
        let coordinator = PaymentCoordinator::new(
            registry.clone(),
            ledger.clone(),
            history.clone(),
            banks.clone(),
        );
        Self {
            registry,
            ledger,
            history,
            banks,
            coordinator,
        }
    }
}
