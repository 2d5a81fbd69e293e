//! Canonical types shared across the order-desk workspace.
//!
//! Exchange and source identifiers are closed enums resolved once at the
//! router boundary, so adapters never re-validate strings. Order payloads
//! flow through as [`serde_json::Value`] until the normalizer maps them
//! into [`OrderItem`].

pub mod credential;
pub mod exchange;
pub mod order;
pub mod source;

// Re-export primary types for convenient access via `od_core::types::*`.
pub use credential::Credential;
pub use exchange::Exchange;
pub use order::{CancelOutcome, CancelReceipt, OrderItem, OrderRef, QueryResult, RawOrder};
pub use source::Source;
