//! Error taxonomy for adapter, vault, and router operations.
//!
//! Adapter failures are tagged values returned to the router, which turns
//! each one into a labeled string in the query's `errors` list or an
//! individual `CancelOutcome { ok: false }`. They never abort a whole
//! operation; the only whole-operation failures are vault errors and an
//! undetermined Binance account mode, both of which occur before any
//! source is selected.

use crate::types::{Exchange, Source};

/// Maximum characters of a response body preserved in error messages.
const BODY_PREVIEW_LIMIT: usize = 500;

/// Truncate a response body for inclusion in an error message.
///
/// Bodies over 500 characters are cut and suffixed with `...`.
pub fn body_preview(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_LIMIT {
        return body.to_string();
    }
    let truncated: String = body.chars().take(BODY_PREVIEW_LIMIT).collect();
    format!("{truncated}...")
}

/// A failure inside one exchange adapter call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    /// The requested source is not valid for this exchange.
    #[error("unsupported source: {0}")]
    UnsupportedSource(Source),
    /// The exchange requires a symbol for this operation.
    #[error("symbol required")]
    MissingSymbol,
    /// Neither an order id nor a client order id was supplied (or, for
    /// Gate, no order id; client-id lookup is unsupported there).
    #[error("order_id or client_order_id required")]
    MissingIdentifier,
    /// Network-level failure: connect, TLS, or the 10-second timeout.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-2xx status or a body that is not the expected JSON shape.
    #[error("request failed ({status}): {body}")]
    Protocol {
        /// HTTP status, or 0 when the body shape was wrong on a 2xx.
        status: u16,
        /// Truncated body preview.
        body: String,
    },
    /// Well-formed exchange error envelope (e.g., OKX non-zero `code`).
    #[error("exchange error code={code} msg={msg}")]
    Business {
        /// Exchange error code.
        code: String,
        /// Exchange error message.
        msg: String,
    },
}

impl AdapterError {
    /// Build a [`AdapterError::Protocol`] with a truncated body preview.
    pub fn protocol(status: u16, body: &str) -> Self {
        AdapterError::Protocol {
            status,
            body: body_preview(body),
        }
    }
}

/// A failure in the external credential vault.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VaultError {
    /// No credential is stored for this (exchange, label) pair.
    #[error("credentials not set for {exchange} account '{label}'")]
    CredentialsNotFound {
        /// Requested exchange.
        exchange: Exchange,
        /// Requested account label.
        label: String,
    },
    /// The vault could not decrypt the stored credential.
    #[error("failed to decrypt credentials")]
    DecryptionFailed,
}

/// Both Binance account-mode probes failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "unable to detect account mode; unified probe status={unified_status} body={unified_body}; \
     classic probe status={classic_status} body={classic_body}"
)]
pub struct AccountModeUndetermined {
    /// HTTP status of the unified-account probe (0 = transport failure).
    pub unified_status: u16,
    /// Truncated unified-probe body or transport error text.
    pub unified_body: String,
    /// HTTP status of the classic-account probe (0 = transport failure).
    pub classic_status: u16,
    /// Truncated classic-probe body or transport error text.
    pub classic_body: String,
}

/// A whole-operation failure in the router.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    /// Credential vault failure.
    #[error(transparent)]
    Vault(#[from] VaultError),
    /// Binance account mode could not be determined, so no default
    /// source set exists for the query.
    #[error(transparent)]
    AccountMode(#[from] AccountModeUndetermined),
}
