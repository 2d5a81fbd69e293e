//! Fan-out orchestration for query, cancel, and lookup.
//!
//! Sources run strictly one at a time. A source failure becomes one
//! labeled entry in the result; the only whole-operation failures are a
//! vault miss and an undetermined Binance account mode, both of which
//! happen before any source is touched.

use std::sync::Arc;

use tracing::{info, warn};

use od_core::config::AppConfig;
use od_core::error::{AdapterError, QueryError};
use od_core::types::{
    CancelOutcome, CancelReceipt, Credential, Exchange, OrderRef, QueryResult, RawOrder, Source,
};
use od_exchanges::account_mode::AccountMode;
use od_exchanges::binance::BinanceAdapter;
use od_exchanges::gate::GateAdapter;
use od_exchanges::okx::OkxAdapter;
use od_exchanges::transport::{HttpTransport, Transport};

use crate::normalize::normalize_order;
use crate::vault::CredentialVault;

/// Per-query source selection.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Explicit source list; when set, no defaults are derived.
    pub sources: Option<Vec<Source>>,
    /// Pinned Binance account mode; skips the probe when set.
    pub account_mode: Option<AccountMode>,
}

/// Routes logical operations to the per-exchange adapters.
pub struct OrderRouter {
    binance: BinanceAdapter,
    gate: GateAdapter,
    okx: OkxAdapter,
    vault: Arc<dyn CredentialVault>,
}

impl OrderRouter {
    /// Build a router over one shared transport and vault.
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        vault: Arc<dyn CredentialVault>,
    ) -> Self {
        Self {
            binance: BinanceAdapter::new(&config.binance, transport.clone()),
            gate: GateAdapter::new(&config.gate, transport.clone()),
            okx: OkxAdapter::new(&config.okx, transport),
            vault,
        }
    }

    /// Build a router with a live pooled HTTP transport using the
    /// configured per-request timeout.
    pub fn with_http_transport(config: &AppConfig, vault: Arc<dyn CredentialVault>) -> Self {
        let transport = Arc::new(HttpTransport::new(config.http.timeout_ms));
        Self::new(config, transport, vault)
    }

    /// Fetch and normalize open orders across the selected sources.
    ///
    /// Source order: explicit selection, else a pinned account mode's
    /// defaults, else (Binance only) the probe-derived defaults. Each
    /// failing source adds one `source: message` entry to `errors`.
    pub async fn query(
        &self,
        exchange: Exchange,
        label: &str,
        options: &QueryOptions,
    ) -> Result<QueryResult, QueryError> {
        let credential = self.vault.get_credentials(exchange, label)?;
        let sources = self.resolve_sources(exchange, options, &credential).await?;

        let mut result = QueryResult::default();
        let mut counts: Vec<(Source, usize)> = Vec::new();
        for source in &sources {
            match self.fetch_open_orders(exchange, *source, &credential).await {
                Ok(raw_orders) => {
                    counts.push((*source, raw_orders.len()));
                    result.orders.extend(
                        raw_orders
                            .iter()
                            .map(|raw| normalize_order(exchange, *source, raw)),
                    );
                }
                Err(err) => {
                    counts.push((*source, 0));
                    warn!(%exchange, source = source.as_str(), error = %err, "source query failed");
                    result.errors.push(format!("{}: {err}", source.as_str()));
                }
            }
        }

        let counts: Vec<String> = counts
            .iter()
            .map(|(source, n)| format!("{}={n}", source.as_str()))
            .collect();
        info!(
            %exchange,
            label,
            orders = result.orders.len(),
            errors = result.errors.len(),
            sources = counts.join(","),
            "query done"
        );
        Ok(result)
    }

    /// Cancel each referenced order independently.
    ///
    /// Validation failures (missing symbol or identifier) produce an
    /// outcome with status 0 and no network request.
    pub async fn cancel(
        &self,
        exchange: Exchange,
        label: &str,
        orders: &[OrderRef],
    ) -> Result<Vec<CancelOutcome>, QueryError> {
        let credential = self.vault.get_credentials(exchange, label)?;

        let mut outcomes = Vec::with_capacity(orders.len());
        for order in orders {
            let outcome = match self.cancel_one(exchange, order, &credential).await {
                Ok(receipt) => CancelOutcome {
                    id: order.id.clone(),
                    ok: receipt.ok,
                    status: receipt.status,
                    message: receipt.body,
                },
                Err(err) => CancelOutcome {
                    id: order.id.clone(),
                    ok: false,
                    status: 0,
                    message: err.to_string(),
                },
            };
            if !outcome.ok {
                warn!(
                    %exchange,
                    source = order.source.as_str(),
                    symbol = %order.symbol,
                    status = outcome.status,
                    "cancel failed"
                );
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Look up one order; the result reuses the query envelope.
    pub async fn lookup(
        &self,
        exchange: Exchange,
        label: &str,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        client_order_id: Option<&str>,
    ) -> Result<QueryResult, QueryError> {
        let credential = self.vault.get_credentials(exchange, label)?;

        let mut result = QueryResult::default();
        let fetched = if source.exchange() != exchange {
            Err(AdapterError::UnsupportedSource(source))
        } else {
            match exchange {
                Exchange::Binance => {
                    self.binance
                        .fetch_order(source, symbol, order_id, client_order_id, &credential)
                        .await
                }
                Exchange::Gate => {
                    self.gate
                        .fetch_order(source, symbol, order_id, &credential)
                        .await
                }
                Exchange::Okx => {
                    self.okx
                        .fetch_order(source, symbol, order_id, client_order_id, &credential)
                        .await
                }
            }
        };
        match fetched {
            Ok(raw) => result.orders.push(normalize_order(exchange, source, &raw)),
            Err(err) => {
                warn!(%exchange, source = source.as_str(), error = %err, "lookup failed");
                result.errors.push(format!("{}: {err}", source.as_str()));
            }
        }
        info!(
            %exchange,
            label,
            source = source.as_str(),
            orders = result.orders.len(),
            errors = result.errors.len(),
            "lookup done"
        );
        Ok(result)
    }

    /// The effective source list for a query.
    async fn resolve_sources(
        &self,
        exchange: Exchange,
        options: &QueryOptions,
        credential: &Credential,
    ) -> Result<Vec<Source>, QueryError> {
        if let Some(sources) = &options.sources {
            if !sources.is_empty() {
                return Ok(sources.clone());
            }
        }
        match exchange {
            Exchange::Binance => {
                let mode = match options.account_mode {
                    Some(mode) => mode,
                    None => {
                        let resolution = self.binance.detect_account_mode(credential).await?;
                        info!(
                            mode = ?resolution.mode,
                            via = %resolution.via,
                            "account mode resolved"
                        );
                        resolution.mode
                    }
                };
                Ok(mode.default_sources().to_vec())
            }
            Exchange::Gate => Ok(vec![Source::GateSpot, Source::GateFutures]),
            Exchange::Okx => Ok(vec![Source::OkxSwap, Source::OkxSpot, Source::OkxMargin]),
        }
    }

    async fn fetch_open_orders(
        &self,
        exchange: Exchange,
        source: Source,
        credential: &Credential,
    ) -> Result<Vec<RawOrder>, AdapterError> {
        if source.exchange() != exchange {
            return Err(AdapterError::UnsupportedSource(source));
        }
        match exchange {
            Exchange::Binance => self.binance.fetch_open_orders(source, credential).await,
            Exchange::Gate => self.gate.fetch_open_orders(source, credential).await,
            Exchange::Okx => self.okx.fetch_open_orders(source, credential).await,
        }
    }

    async fn cancel_one(
        &self,
        exchange: Exchange,
        order: &OrderRef,
        credential: &Credential,
    ) -> Result<CancelReceipt, AdapterError> {
        if order.source.exchange() != exchange {
            return Err(AdapterError::UnsupportedSource(order.source));
        }
        let order_id = order.order_id.as_deref();
        let client_order_id = order.client_order_id.as_deref();
        match exchange {
            Exchange::Binance => {
                self.binance
                    .cancel_order(order.source, &order.symbol, order_id, client_order_id, credential)
                    .await
            }
            Exchange::Gate => {
                self.gate
                    .cancel_order(order.source, &order.symbol, order_id, credential)
                    .await
            }
            Exchange::Okx => {
                self.okx
                    .cancel_order(order.source, &order.symbol, order_id, client_order_id, credential)
                    .await
            }
        }
    }
}
