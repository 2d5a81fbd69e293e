//! Canonical order model and per-operation result envelopes.

use serde::{Deserialize, Serialize};

use super::exchange::Exchange;
use super::source::Source;

/// An exchange-specific order payload, untouched until normalization.
pub type RawOrder = serde_json::Value;

/// The exchange-agnostic representation of one order.
///
/// `id` is `exchange:source:symbol:orderKey` where `orderKey` prefers the
/// exchange order id, then the client order id, then a freshly generated
/// opaque token. The token fallback means `id` is not stable across
/// repeated queries for orders lacking both identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Canonical identifier: `exchange:source:symbol:orderKey`.
    pub id: String,
    /// Exchange the order lives on.
    pub exchange: Exchange,
    /// Sub-market the order was fetched from.
    pub source: Source,
    /// Upper-cased trading pair / contract symbol.
    pub symbol: String,
    /// Order side as reported by the exchange (e.g., "BUY", "sell").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    /// Exchange order type (e.g., "LIMIT", "limit").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
    /// Exchange order status (e.g., "NEW", "live", "open").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Limit price as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Original requested quantity as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_qty: Option<String>,
    /// Quantity already executed as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_qty: Option<String>,
    /// Creation time, epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<i64>,
    /// Last update time, epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time_ms: Option<i64>,
    /// Exchange-assigned order id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Client-assigned order id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// Futures position side (e.g., "LONG", "SHORT", "BOTH").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_side: Option<String>,
    /// Whether the order only reduces an existing position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_only: Option<bool>,
}

/// Aggregated result of a query or lookup operation.
///
/// Queries never fail atomically: each failed source contributes one
/// labeled entry to `errors` while the other sources' orders survive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Normalized orders from all sources that succeeded.
    pub orders: Vec<OrderItem>,
    /// One entry per failed source, labeled `source: message`.
    #[serde(default)]
    pub errors: Vec<String>,
}

/// A caller-supplied reference to one order to cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    /// Caller's handle for this order, echoed back in the outcome.
    pub id: String,
    /// Sub-market the order lives on.
    pub source: Source,
    /// Trading pair / contract symbol.
    pub symbol: String,
    /// Exchange-assigned order id (takes precedence when both given).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Client-assigned order id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

/// Outcome of one cancel attempt, independent of its siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOutcome {
    /// Caller's handle from the matching [`OrderRef`].
    pub id: String,
    /// Whether the exchange accepted the cancel.
    pub ok: bool,
    /// HTTP status of the cancel call, or 0 if no request was issued.
    pub status: u16,
    /// Raw response body or error description.
    pub message: String,
}

/// What an adapter's cancel call produced at the wire level.
///
/// `ok` already encodes the exchange's success rule: plain 2xx for
/// Binance and Gate; for OKX additionally the envelope `code` and every
/// element's `sCode` must be `""` or `"0"`.
#[derive(Debug, Clone)]
pub struct CancelReceipt {
    /// HTTP status of the cancel call.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// Exchange-specific success verdict.
    pub ok: bool,
}
