//! Per-exchange sub-market ("source") identifiers.
//!
//! Each source maps to exactly one base URL and path set inside its
//! exchange adapter. The wire labels match the original API contract
//! (`papi_um`, `gate_spot`, ...) so existing callers keep working.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::exchange::Exchange;

/// One sub-market/API surface within an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Binance portfolio-margin USD-M futures.
    #[serde(rename = "papi_um")]
    BinancePapiUm,
    /// Binance portfolio-margin spot/margin.
    #[serde(rename = "papi_spot")]
    BinancePapiSpot,
    /// Binance classic USD-M futures.
    #[serde(rename = "fapi_um")]
    BinanceFapiUm,
    /// Binance classic spot.
    #[serde(rename = "spot")]
    BinanceSpot,
    /// Gate.io spot.
    #[serde(rename = "gate_spot")]
    GateSpot,
    /// Gate.io perpetual futures.
    #[serde(rename = "gate_futures")]
    GateFutures,
    /// OKX perpetual swap.
    #[serde(rename = "okx_swap")]
    OkxSwap,
    /// OKX spot.
    #[serde(rename = "okx_spot")]
    OkxSpot,
    /// OKX margin.
    #[serde(rename = "okx_margin")]
    OkxMargin,
}

impl Source {
    /// The exchange this source belongs to.
    pub fn exchange(&self) -> Exchange {
        match self {
            Source::BinancePapiUm
            | Source::BinancePapiSpot
            | Source::BinanceFapiUm
            | Source::BinanceSpot => Exchange::Binance,
            Source::GateSpot | Source::GateFutures => Exchange::Gate,
            Source::OkxSwap | Source::OkxSpot | Source::OkxMargin => Exchange::Okx,
        }
    }

    /// Wire label used in canonical order ids and error strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::BinancePapiUm => "papi_um",
            Source::BinancePapiSpot => "papi_spot",
            Source::BinanceFapiUm => "fapi_um",
            Source::BinanceSpot => "spot",
            Source::GateSpot => "gate_spot",
            Source::GateFutures => "gate_futures",
            Source::OkxSwap => "okx_swap",
            Source::OkxSpot => "okx_spot",
            Source::OkxMargin => "okx_margin",
        }
    }

    /// The OKX `instType` parameter for this source, if it is an OKX source.
    pub fn okx_inst_type(&self) -> Option<&'static str> {
        match self {
            Source::OkxSwap => Some("SWAP"),
            Source::OkxSpot => Some("SPOT"),
            Source::OkxMargin => Some("MARGIN"),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "papi_um" => Ok(Source::BinancePapiUm),
            "papi_spot" => Ok(Source::BinancePapiSpot),
            "fapi_um" => Ok(Source::BinanceFapiUm),
            "spot" => Ok(Source::BinanceSpot),
            "gate_spot" => Ok(Source::GateSpot),
            "gate_futures" => Ok(Source::GateFutures),
            "okx_swap" => Ok(Source::OkxSwap),
            "okx_spot" => Ok(Source::OkxSpot),
            "okx_margin" => Ok(Source::OkxMargin),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

/// Parse error for [`Source`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown source: {0}")]
pub struct UnknownSource(pub String);
