//! payrail — a small distributed payments platform.
//!
//! Three process roles, one crate:
//!
//! - [`gateway`] - authenticated RPC surface, idempotency ledger, durable
//!   transaction history, and the two-phase commit coordinator
//! - [`bank`] - 2PC participant holding durable account balances
//! - [`client`] - CLI with a crash-safe offline queue and retry loop
//!
//! Shared plumbing lives in [`messages`] (wire types), [`json_store`]
//! (atomic file persistence), [`config`], [`logging`] and [`tls`].

pub mod bank;
pub mod client;
pub mod config;
pub mod gateway;
pub mod json_store;
pub mod logging;
pub mod messages;
pub mod tls;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use gateway::coordinator::PaymentCoordinator;
pub use messages::{PaymentRequest, TransactionRecord};
