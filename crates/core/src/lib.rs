//! # od-core
//!
//! Shared building blocks for the order-desk workspace: the canonical
//! exchange/source/order model, the adapter error taxonomy, layered
//! configuration, and logging initialization.
//!
//! Nothing in this crate touches the network; it is consumed by the
//! exchange adapters (`od-exchanges`) and the orchestration router
//! (`od-router`).

pub mod config;
pub mod error;
pub mod logging;
pub mod types;
