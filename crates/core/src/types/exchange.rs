//! Exchange identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Binance spot, classic futures, and portfolio-margin surfaces.
    Binance,
    /// Gate.io spot and perpetual futures.
    Gate,
    /// OKX v5 unified trading.
    Okx,
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exchange::Binance => write!(f, "binance"),
            Exchange::Gate => write!(f, "gate"),
            Exchange::Okx => write!(f, "okx"),
        }
    }
}

impl FromStr for Exchange {
    type Err = UnknownExchange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "gate" => Ok(Exchange::Gate),
            "okx" => Ok(Exchange::Okx),
            other => Err(UnknownExchange(other.to_string())),
        }
    }
}

/// Parse error for [`Exchange`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown exchange: {0}")]
pub struct UnknownExchange(pub String);
