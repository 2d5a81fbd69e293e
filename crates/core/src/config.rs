//! Layered configuration for the order-desk core.
//!
//! Configuration is loaded in layers with increasing priority:
//! 1. Compiled-in defaults (live exchange URLs, 10-second HTTP timeout)
//! 2. TOML configuration file (if provided)
//! 3. Environment variable overrides (prefix `ORDER_DESK_`, nested with
//!    `__`, e.g. `ORDER_DESK_GATE__SETTLE=btc`)
//!
//! API keys and secrets never appear here; the credential vault owns
//! them and hands a decrypted copy to each operation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default per-request HTTP timeout: 10 000 ms.
fn default_timeout_ms() -> u64 {
    10_000
}

/// Default Gate spot account type.
fn default_gate_spot_account() -> String {
    "unified".to_string()
}

/// Default Gate futures settlement currency.
fn default_gate_settle() -> String {
    "usdt".to_string()
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Binance endpoint settings.
    pub binance: BinanceConfig,
    /// Gate.io endpoint settings.
    pub gate: GateConfig,
    /// OKX endpoint settings.
    pub okx: OkxConfig,
    /// HTTP transport settings.
    pub http: HttpConfig,
}

/// Binance splits its REST surface across three hosts.
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceConfig {
    /// Portfolio-margin API base URL.
    pub papi_url: String,
    /// Classic USD-M futures API base URL.
    pub fapi_url: String,
    /// Classic spot API base URL.
    pub spot_url: String,
}

/// Gate.io endpoint and account settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// API base URL.
    pub base_url: String,
    /// Spot account type sent as the `account` query parameter.
    #[serde(default = "default_gate_spot_account")]
    pub spot_account: String,
    /// Futures settlement currency, lower-cased into the path.
    #[serde(default = "default_gate_settle")]
    pub settle: String,
}

/// OKX endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OkxConfig {
    /// API base URL.
    pub base_url: String,
    /// When `true`, send the `x-simulated-trading: 1` header.
    #[serde(default)]
    pub simulated_trading: bool,
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in milliseconds. No retry, no circuit breaker;
    /// a timeout surfaces as a transport error for that one call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration using layered sources.
    ///
    /// 1. Compiled-in defaults pointing at the live exchange hosts.
    /// 2. TOML file at `config_path` (if `Some`).
    /// 3. Environment variable overrides with prefix `ORDER_DESK_` and
    ///    `__` as the nesting separator.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("binance.papi_url", "https://papi.binance.com")?
            .set_default("binance.fapi_url", "https://fapi.binance.com")?
            .set_default("binance.spot_url", "https://api.binance.com")?
            .set_default("gate.base_url", "https://api.gateio.ws")?
            .set_default("gate.spot_account", "unified")?
            .set_default("gate.settle", "usdt")?
            .set_default("okx.base_url", "https://www.okx.com")?
            .set_default("okx.simulated_trading", false)?
            .set_default("http.timeout_ms", 10_000i64)?;

        if let Some(path) = config_path {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            builder = builder.add_source(File::with_name(path_str).required(true));
        }

        // The prefix separator must be set explicitly to `_` because the
        // `config` crate defaults it to the nesting separator when one is
        // provided.
        builder = builder.add_source(
            Environment::with_prefix("ORDER_DESK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}
