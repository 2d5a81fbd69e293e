//! Binance account-mode probing.
//!
//! A Binance account is either **Unified** (portfolio margin, one shared
//! margin pool) or **Standard** (classic, per-product margin). When the
//! caller has neither selected sources explicitly nor pinned a mode, the
//! router resolves it with a two-step probe: the portfolio-margin account
//! endpoint first, then the classic futures account endpoint. Only when
//! both probes fail does the whole query abort with
//! [`AccountModeUndetermined`].

use tracing::debug;

use od_core::error::{body_preview, AccountModeUndetermined, AdapterError};
use od_core::types::{Credential, Source};

use crate::binance::BinanceAdapter;
use crate::transport::Method;

/// Unified-account probe path (portfolio-margin API).
const UNIFIED_PROBE_PATH: &str = "/papi/v1/um/account";
/// Classic-account probe path (classic futures API).
const CLASSIC_PROBE_PATH: &str = "/fapi/v2/account";

/// Maximum recursion depth when searching probe JSON for account-type
/// markers. JSON values are tree-shaped, so depth limiting alone bounds
/// the traversal.
const SEARCH_DEPTH_LIMIT: u32 = 6;

/// Resolved Binance account mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMode {
    /// Portfolio-margin account: margin shared across product types.
    Unified,
    /// Classic account: per-product isolated margin.
    Standard,
}

impl AccountMode {
    /// Default query source set for this mode.
    pub fn default_sources(&self) -> &'static [Source] {
        match self {
            AccountMode::Unified => &[
                Source::BinancePapiUm,
                Source::BinancePapiSpot,
                Source::BinanceFapiUm,
            ],
            AccountMode::Standard => &[Source::BinanceFapiUm, Source::BinanceSpot],
        }
    }
}

/// Which probe decided the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVia {
    /// The portfolio-margin account endpoint answered 2xx.
    UnifiedProbe,
    /// The classic futures account endpoint answered 2xx.
    ClassicProbe,
}

impl std::fmt::Display for ProbeVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeVia::UnifiedProbe => write!(f, "unified-probe"),
            ProbeVia::ClassicProbe => write!(f, "classic-probe"),
        }
    }
}

/// Outcome of a successful mode probe.
#[derive(Debug, Clone)]
pub struct ModeResolution {
    /// The resolved account mode.
    pub mode: AccountMode,
    /// Which probe decided it.
    pub via: ProbeVia,
    /// HTTP status of the unified probe (0 = transport failure).
    pub unified_status: u16,
    /// HTTP status of the classic probe, if it was attempted.
    pub classic_status: Option<u16>,
}

impl BinanceAdapter {
    /// Probe the account mode for the given credential.
    ///
    /// Step 1 hits the unified-account endpoint; a 2xx answer resolves
    /// from the response body (any explicit `accountType`, or a true
    /// portfolio-margin flag, defaulting to Unified). Step 2 falls back
    /// to the classic-account endpoint, whose 2xx means Standard. A
    /// transport failure counts as a failed probe (status 0).
    pub async fn detect_account_mode(
        &self,
        credential: &Credential,
    ) -> Result<ModeResolution, AccountModeUndetermined> {
        let (unified_status, unified_body) = self
            .probe(self.papi_url(), UNIFIED_PROBE_PATH, credential)
            .await;
        if (200..300).contains(&unified_status) {
            let data: serde_json::Value =
                serde_json::from_str(&unified_body).unwrap_or(serde_json::Value::Null);
            let mode = match parse_account_type(&data).as_deref() {
                Some("STANDARD") => AccountMode::Standard,
                // "PORTFOLIO", "UNIFIED", anything else, or no marker at
                // all: a reachable papi account defaults to Unified.
                _ => AccountMode::Unified,
            };
            debug!(?mode, unified_status, "account mode via unified probe");
            return Ok(ModeResolution {
                mode,
                via: ProbeVia::UnifiedProbe,
                unified_status,
                classic_status: None,
            });
        }

        let (classic_status, classic_body) = self
            .probe(self.fapi_url(), CLASSIC_PROBE_PATH, credential)
            .await;
        if (200..300).contains(&classic_status) {
            debug!(unified_status, classic_status, "account mode via classic probe");
            return Ok(ModeResolution {
                mode: AccountMode::Standard,
                via: ProbeVia::ClassicProbe,
                unified_status,
                classic_status: Some(classic_status),
            });
        }

        Err(AccountModeUndetermined {
            unified_status,
            unified_body: body_preview(&unified_body),
            classic_status,
            classic_body: body_preview(&classic_body),
        })
    }

    /// One signed probe GET; transport failures become status 0 with the
    /// error text as body so both probes always report something.
    async fn probe(&self, base_url: &str, path: &str, credential: &Credential) -> (u16, String) {
        match self
            .request_signed(Method::Get, base_url, path, Vec::new(), credential)
            .await
        {
            Ok(resp) => (resp.status, resp.body),
            Err(AdapterError::Transport(msg)) => (0, msg),
            Err(other) => (0, other.to_string()),
        }
    }
}

/// Search probe JSON for an account-type marker.
///
/// Returns the upper-cased `accountType` string if one is found, or
/// `"PORTFOLIO"` if any of the portfolio-margin boolean flags is true.
/// The traversal is depth-limited to 6 levels.
pub fn parse_account_type(data: &serde_json::Value) -> Option<String> {
    search(data, 0)
}

fn search(value: &serde_json::Value, depth: u32) -> Option<String> {
    if depth > SEARCH_DEPTH_LIMIT {
        return None;
    }
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                if key == "accountType" {
                    if let Some(s) = child.as_str() {
                        let trimmed = s.trim();
                        if !trimmed.is_empty() {
                            return Some(trimmed.to_uppercase());
                        }
                    }
                }
                if matches!(
                    key.as_str(),
                    "portfolioMargin" | "isPortfolioMargin" | "portfolioMarginAccount"
                ) && child.as_bool() == Some(true)
                {
                    return Some("PORTFOLIO".to_string());
                }
                if let Some(found) = search(child, depth + 1) {
                    return Some(found);
                }
            }
            None
        }
        serde_json::Value::Array(items) => {
            items.iter().find_map(|item| search(item, depth + 1))
        }
        _ => None,
    }
}
