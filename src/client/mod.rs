//! Payments client: gateway API calls, the durable offline queue, and the
//! CLI command layer on top of both.

pub mod api;
pub mod commands;
pub mod queue;

pub use api::{ClientError, GatewayClient};
pub use queue::{OfflineQueue, DEFAULT_QUEUE_FILE};
