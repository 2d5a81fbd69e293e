//! Credential vault seam.
//!
//! The router never stores secrets. It asks the vault for one decrypted
//! [`Credential`] at the start of each logical operation, holds it for
//! the operation's duration, and drops it. Encryption at rest, sessions,
//! and key derivation live behind this trait.

use std::collections::HashMap;

use od_core::error::VaultError;
use od_core::types::{Credential, Exchange};

/// Source of decrypted API credentials, keyed by exchange and account
/// label.
pub trait CredentialVault: Send + Sync {
    /// Return the decrypted credential for the given account.
    fn get_credentials(&self, exchange: Exchange, label: &str) -> Result<Credential, VaultError>;
}

/// In-memory vault for tests and embedding.
#[derive(Default)]
pub struct StaticVault {
    entries: HashMap<(Exchange, String), Credential>,
}

impl StaticVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one credential, keyed by its exchange and label.
    pub fn insert(&mut self, credential: Credential) {
        self.entries.insert(
            (credential.exchange, credential.label.clone()),
            credential,
        );
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, credential: Credential) -> Self {
        self.insert(credential);
        self
    }
}

impl CredentialVault for StaticVault {
    fn get_credentials(&self, exchange: Exchange, label: &str) -> Result<Credential, VaultError> {
        self.entries
            .get(&(exchange, label.to_string()))
            .cloned()
            .ok_or_else(|| VaultError::CredentialsNotFound {
                exchange,
                label: label.to_string(),
            })
    }
}
