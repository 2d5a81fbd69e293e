//! # od-router
//!
//! Orchestration layer on top of the exchange adapters. A single logical
//! `query`, `cancel`, or `lookup` fans out across the selected sources;
//! each source failure becomes one labeled entry in the result instead of
//! aborting the operation. Credentials come from a [`CredentialVault`]
//! once per operation and are passed by reference into adapter calls.
//!
//! [`CredentialVault`]: vault::CredentialVault

pub mod normalize;
pub mod router;
pub mod vault;

pub use router::{OrderRouter, QueryOptions};
pub use vault::{CredentialVault, StaticVault};
