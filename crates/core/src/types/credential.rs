//! Decrypted API credentials, held only for the duration of one operation.

use std::fmt;

use super::exchange::Exchange;

/// A transient decrypted credential for one (exchange, label) pair.
///
/// The vault owns the encrypted form; the core only ever sees a decrypted
/// copy passed by reference into adapter calls, so credentials never
/// outlive the operation that needed them.
#[derive(Clone)]
pub struct Credential {
    /// Exchange the credential authenticates against.
    pub exchange: Exchange,
    /// Operator-chosen account label (e.g., "main", "sub-1").
    pub label: String,
    /// API key, sent in the exchange's auth header.
    pub api_key: String,
    /// API secret used for request signing.
    pub api_secret: String,
    /// Signing passphrase, required by OKX only.
    pub api_passphrase: Option<String>,
}

// Manual Debug keeps key material out of logs and panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("exchange", &self.exchange)
            .field("label", &self.label)
            .field("api_key", &crate::logging::mask_key(&self.api_key))
            .field("api_secret", &"[REDACTED]")
            .field(
                "api_passphrase",
                &self.api_passphrase.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Credential {
    /// The passphrase, or an empty string when none is set.
    ///
    /// OKX signing always sends the `OK-ACCESS-PASSPHRASE` header.
    pub fn passphrase(&self) -> &str {
        self.api_passphrase.as_deref().unwrap_or("")
    }
}
