//! Binance REST adapter for order management.
//!
//! Binance splits its authenticated surface across three hosts: the
//! portfolio-margin API (`papi`), the classic USD-M futures API (`fapi`),
//! and the classic spot API. Each [`Source`] maps to exactly one host and
//! path set. All requests are signed query strings (HMAC-SHA256) with the
//! `X-MBX-APIKEY` auth header; there is no pagination; one call returns
//! the full open-order set for a source.

use std::sync::Arc;

use tracing::debug;

use od_core::config::BinanceConfig;
use od_core::error::AdapterError;
use od_core::types::{CancelReceipt, Credential, RawOrder, Source};

use crate::signing::{build_sorted_query, sign_binance_request};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Default `recvWindow` in milliseconds, sent when the caller supplies none.
const DEFAULT_RECV_WINDOW: &str = "5000";

/// Binance REST adapter.
///
/// Holds no credentials; each call receives a caller-scoped
/// [`Credential`] and discards it when the call returns.
pub struct BinanceAdapter {
    papi_url: String,
    fapi_url: String,
    spot_url: String,
    transport: Arc<dyn Transport>,
}

impl BinanceAdapter {
    /// Create an adapter over the given endpoints and transport.
    pub fn new(config: &BinanceConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            papi_url: config.papi_url.clone(),
            fapi_url: config.fapi_url.clone(),
            spot_url: config.spot_url.clone(),
            transport,
        }
    }

    pub(crate) fn papi_url(&self) -> &str {
        &self.papi_url
    }

    pub(crate) fn fapi_url(&self) -> &str {
        &self.fapi_url
    }

    /// Base URL and path of the open-orders listing for a source.
    fn open_orders_endpoint(&self, source: Source) -> Result<(&str, &'static str), AdapterError> {
        match source {
            Source::BinancePapiUm => Ok((&self.papi_url, "/papi/v1/um/openOrders")),
            Source::BinancePapiSpot => Ok((&self.papi_url, "/papi/v1/margin/openOrders")),
            Source::BinanceFapiUm => Ok((&self.fapi_url, "/fapi/v1/openOrders")),
            Source::BinanceSpot => Ok((&self.spot_url, "/api/v3/openOrders")),
            other => Err(AdapterError::UnsupportedSource(other)),
        }
    }

    /// Base URL and path of the single-order endpoint (cancel and lookup
    /// share it) for a source.
    fn order_endpoint(&self, source: Source) -> Result<(&str, &'static str), AdapterError> {
        match source {
            Source::BinancePapiUm => Ok((&self.papi_url, "/papi/v1/um/order")),
            Source::BinancePapiSpot => Ok((&self.papi_url, "/papi/v1/margin/order")),
            Source::BinanceFapiUm => Ok((&self.fapi_url, "/fapi/v1/order")),
            Source::BinanceSpot => Ok((&self.spot_url, "/api/v3/order")),
            other => Err(AdapterError::UnsupportedSource(other)),
        }
    }

    /// Sign and send one request: merge `recvWindow` and `timestamp`,
    /// serialize sorted, sign, and append `&signature=...`.
    pub(crate) async fn request_signed(
        &self,
        method: Method,
        base_url: &str,
        path: &str,
        mut params: Vec<(String, String)>,
        credential: &Credential,
    ) -> Result<HttpResponse, AdapterError> {
        if !params.iter().any(|(k, _)| k == "recvWindow") {
            params.push(("recvWindow".to_string(), DEFAULT_RECV_WINDOW.to_string()));
        }
        params.push((
            "timestamp".to_string(),
            chrono::Utc::now().timestamp_millis().to_string(),
        ));

        let query = build_sorted_query(&params);
        let signature = sign_binance_request(&credential.api_secret, &query);
        let url = format!(
            "{}{}?{}&signature={}",
            base_url.trim_end_matches('/'),
            path,
            query,
            signature
        );

        debug!(method = %method, path, "binance signed request");

        self.transport
            .send(HttpRequest {
                method,
                url,
                headers: vec![("X-MBX-APIKEY".to_string(), credential.api_key.clone())],
                body: None,
            })
            .await
    }

    /// Fetch all open orders for one source.
    ///
    /// A single signed GET; the 2xx body is the result array directly.
    pub async fn fetch_open_orders(
        &self,
        source: Source,
        credential: &Credential,
    ) -> Result<Vec<RawOrder>, AdapterError> {
        let (base_url, path) = self.open_orders_endpoint(source)?;
        let resp = self
            .request_signed(Method::Get, base_url, path, Vec::new(), credential)
            .await?;
        if !resp.is_success() {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        }
        let payload: serde_json::Value = serde_json::from_str(&resp.body)
            .map_err(|_| AdapterError::protocol(resp.status, &resp.body))?;
        match payload {
            serde_json::Value::Array(items) => Ok(items),
            _ => Err(AdapterError::protocol(resp.status, &resp.body)),
        }
    }

    /// Cancel one order. `order_id` takes precedence over
    /// `client_order_id` when both are given; Binance requires the symbol.
    pub async fn cancel_order(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        client_order_id: Option<&str>,
        credential: &Credential,
    ) -> Result<CancelReceipt, AdapterError> {
        let (base_url, path) = self.order_endpoint(source)?;
        let params = identifier_params(symbol, order_id, client_order_id)?;
        let resp = self
            .request_signed(Method::Delete, base_url, path, params, credential)
            .await?;
        Ok(CancelReceipt {
            ok: resp.is_success(),
            status: resp.status,
            body: resp.body,
        })
    }

    /// Look up one order by exchange id or client id.
    pub async fn fetch_order(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        client_order_id: Option<&str>,
        credential: &Credential,
    ) -> Result<RawOrder, AdapterError> {
        let (base_url, path) = self.order_endpoint(source)?;
        let params = identifier_params(symbol, order_id, client_order_id)?;
        let resp = self
            .request_signed(Method::Get, base_url, path, params, credential)
            .await?;
        if !resp.is_success() {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        }
        let payload: serde_json::Value = serde_json::from_str(&resp.body)
            .map_err(|_| AdapterError::protocol(resp.status, &resp.body))?;
        if !payload.is_object() {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        }
        Ok(payload)
    }
}

/// Build the symbol + identifier parameters shared by cancel and lookup.
fn identifier_params(
    symbol: &str,
    order_id: Option<&str>,
    client_order_id: Option<&str>,
) -> Result<Vec<(String, String)>, AdapterError> {
    if symbol.is_empty() {
        return Err(AdapterError::MissingSymbol);
    }
    let mut params = vec![("symbol".to_string(), symbol.to_string())];
    match (non_empty(order_id), non_empty(client_order_id)) {
        (Some(id), _) => params.push(("orderId".to_string(), id.to_string())),
        (None, Some(cid)) => params.push(("origClientOrderId".to_string(), cid.to_string())),
        (None, None) => return Err(AdapterError::MissingIdentifier),
    }
    Ok(params)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
