//! # od-exchanges
//!
//! Per-exchange REST adapters for Binance, Gate.io, and OKX: request
//! signing, pagination, response-envelope interpretation, and the
//! Binance account-mode probe. Adapters return tagged [`AdapterError`]
//! values to the router instead of aborting, so one source's failure
//! never discards another source's results.
//!
//! [`AdapterError`]: od_core::error::AdapterError

pub mod account_mode;
pub mod binance;
pub mod gate;
pub mod okx;
pub mod signing;
pub mod transport;
