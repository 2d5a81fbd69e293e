//! Gate.io v4 REST adapter.
//!
//! Gate signs the canonical payload `METHOD\nPATH\nQUERY\nSHA512(BODY)\n
//! TIMESTAMP` with HMAC-SHA512 and sends the result in the `SIGN` header,
//! next to `KEY` and `Timestamp`. Listings are page-numbered: the loop
//! requests pages of 100 and stops on the first empty or short batch.
//! Cancels and lookups address the order by path segment, so Gate needs
//! an exchange `order_id`; client ids are not accepted.

use std::sync::Arc;

use tracing::debug;

use od_core::config::GateConfig;
use od_core::error::AdapterError;
use od_core::types::{CancelReceipt, Credential, RawOrder, Source};

use crate::signing::{build_sorted_query, sign_gate_request};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// All Gate v4 paths hang off this prefix; it is part of the signed path.
const API_PREFIX: &str = "/api/v4";

/// Page size for open-order listings.
const PAGE_LIMIT: usize = 100;

/// Gate.io REST adapter.
pub struct GateAdapter {
    base_url: String,
    spot_account: String,
    settle: String,
    transport: Arc<dyn Transport>,
}

impl GateAdapter {
    /// Create an adapter over the given endpoint and transport.
    pub fn new(config: &GateConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            spot_account: config.spot_account.clone(),
            settle: config.settle.to_lowercase(),
            transport,
        }
    }

    /// Sign and send one request against `API_PREFIX + path`.
    ///
    /// Empty parameter values are dropped before serialization, and the
    /// signed query is byte-identical to the query sent on the URL.
    async fn request_signed(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<String>,
        credential: &Credential,
    ) -> Result<HttpResponse, AdapterError> {
        let kept: Vec<(String, String)> =
            params.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        let query = build_sorted_query(&kept);
        let full_path = format!("{API_PREFIX}{path}");
        let timestamp = chrono::Utc::now().timestamp();
        let body_str = body.as_deref().unwrap_or("");
        let signature = sign_gate_request(
            &credential.api_secret,
            &method.to_string(),
            &full_path,
            &query,
            body_str,
            timestamp,
        );

        let mut url = format!("{}{}", self.base_url.trim_end_matches('/'), full_path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        debug!(method = %method, path = %full_path, "gate signed request");

        self.transport
            .send(HttpRequest {
                method,
                url,
                headers: vec![
                    ("Accept".to_string(), "application/json".to_string()),
                    ("Content-Type".to_string(), "application/json".to_string()),
                    ("KEY".to_string(), credential.api_key.clone()),
                    ("Timestamp".to_string(), timestamp.to_string()),
                    ("SIGN".to_string(), signature),
                ],
                body,
            })
            .await
    }

    /// Fetch all open orders for one source, walking pages of 100.
    pub async fn fetch_open_orders(
        &self,
        source: Source,
        credential: &Credential,
    ) -> Result<Vec<RawOrder>, AdapterError> {
        match source {
            Source::GateSpot => self.fetch_spot_open_orders(credential).await,
            Source::GateFutures => self.fetch_futures_open_orders(credential).await,
            other => Err(AdapterError::UnsupportedSource(other)),
        }
    }

    /// Spot listing. The envelope is either a bare array or an object
    /// with an `orders` array; non-object elements are dropped.
    async fn fetch_spot_open_orders(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RawOrder>, AdapterError> {
        let mut orders = Vec::new();
        let mut page: u32 = 1;
        loop {
            let params = vec![
                ("page".to_string(), page.to_string()),
                ("limit".to_string(), PAGE_LIMIT.to_string()),
                ("account".to_string(), self.spot_account.clone()),
            ];
            let resp = self
                .request_signed(Method::Get, "/spot/open_orders", params, None, credential)
                .await?;
            if !resp.is_success() {
                return Err(AdapterError::protocol(resp.status, &resp.body));
            }

            let parsed: serde_json::Value = serde_json::from_str(&resp.body)
                .map_err(|_| AdapterError::protocol(resp.status, &resp.body))?;
            let batch = match parsed {
                serde_json::Value::Object(mut map) => match map.remove("orders") {
                    Some(serde_json::Value::Array(items)) => items,
                    None => Vec::new(),
                    Some(_) => return Err(AdapterError::protocol(resp.status, &resp.body)),
                },
                serde_json::Value::Array(items) => items,
                _ => return Err(AdapterError::protocol(resp.status, &resp.body)),
            };
            let batch: Vec<RawOrder> =
                batch.into_iter().filter(|item| item.is_object()).collect();

            if batch.is_empty() {
                break;
            }
            let short = batch.len() < PAGE_LIMIT;
            orders.extend(batch);
            if short {
                break;
            }
            page += 1;
        }
        Ok(orders)
    }

    /// Futures listing under the settlement currency. Bare array only.
    async fn fetch_futures_open_orders(
        &self,
        credential: &Credential,
    ) -> Result<Vec<RawOrder>, AdapterError> {
        let path = format!("/futures/{}/orders", self.settle);
        let mut orders = Vec::new();
        let mut page: u32 = 1;
        loop {
            let params = vec![
                ("status".to_string(), "open".to_string()),
                ("page".to_string(), page.to_string()),
                ("limit".to_string(), PAGE_LIMIT.to_string()),
            ];
            let resp = self
                .request_signed(Method::Get, &path, params, None, credential)
                .await?;
            if !resp.is_success() {
                return Err(AdapterError::protocol(resp.status, &resp.body));
            }

            let parsed: serde_json::Value = serde_json::from_str(&resp.body)
                .map_err(|_| AdapterError::protocol(resp.status, &resp.body))?;
            let serde_json::Value::Array(items) = parsed else {
                return Err(AdapterError::protocol(resp.status, &resp.body));
            };
            let batch: Vec<RawOrder> =
                items.into_iter().filter(|item| item.is_object()).collect();

            if batch.is_empty() {
                break;
            }
            let short = batch.len() < PAGE_LIMIT;
            orders.extend(batch);
            if short {
                break;
            }
            page += 1;
        }
        Ok(orders)
    }

    /// Cancel one order by exchange id.
    ///
    /// Spot needs the symbol (`currency_pair`); futures sends `contract`
    /// only when a symbol is given. Client order ids are rejected because
    /// the id is a path segment.
    pub async fn cancel_order(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        credential: &Credential,
    ) -> Result<CancelReceipt, AdapterError> {
        let (path, params) = self.order_request(source, symbol, order_id)?;
        let resp = self
            .request_signed(Method::Delete, &path, params, None, credential)
            .await?;
        Ok(CancelReceipt {
            ok: resp.is_success(),
            status: resp.status,
            body: resp.body,
        })
    }

    /// Look up one order by exchange id.
    pub async fn fetch_order(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        credential: &Credential,
    ) -> Result<RawOrder, AdapterError> {
        let (path, params) = self.order_request(source, symbol, order_id)?;
        let resp = self
            .request_signed(Method::Get, &path, params, None, credential)
            .await?;
        if !resp.is_success() {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        }
        let parsed: serde_json::Value = serde_json::from_str(&resp.body)
            .map_err(|_| AdapterError::protocol(resp.status, &resp.body))?;
        if !parsed.is_object() {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        }
        Ok(parsed)
    }

    /// Path and parameters shared by cancel and lookup.
    fn order_request(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
    ) -> Result<(String, Vec<(String, String)>), AdapterError> {
        let order_id = order_id
            .filter(|id| !id.is_empty())
            .ok_or(AdapterError::MissingIdentifier)?;
        match source {
            Source::GateSpot => {
                if symbol.is_empty() {
                    return Err(AdapterError::MissingSymbol);
                }
                Ok((
                    format!("/spot/orders/{order_id}"),
                    vec![
                        ("currency_pair".to_string(), symbol.to_string()),
                        ("account".to_string(), self.spot_account.clone()),
                    ],
                ))
            }
            Source::GateFutures => {
                let params = if symbol.is_empty() {
                    Vec::new()
                } else {
                    vec![("contract".to_string(), symbol.to_string())]
                };
                Ok((format!("/futures/{}/orders/{order_id}", self.settle), params))
            }
            other => Err(AdapterError::UnsupportedSource(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use od_core::types::Exchange;

    fn config() -> GateConfig {
        GateConfig {
            base_url: "https://gate.test".to_string(),
            spot_account: "unified".to_string(),
            settle: "usdt".to_string(),
        }
    }

    fn credential() -> Credential {
        Credential {
            exchange: Exchange::Gate,
            label: "main".to_string(),
            api_key: "gate_key".to_string(),
            api_secret: "gate_secret".to_string(),
            api_passphrase: None,
        }
    }

    fn adapter(transport: Arc<ScriptedTransport>) -> GateAdapter {
        GateAdapter::new(&config(), transport)
    }

    fn spot_batch(count: usize, start: usize) -> String {
        let items: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"id":"{}","currency_pair":"BTC_USDT"}}"#, start + i))
            .collect();
        format!("[{}]", items.join(","))
    }

    #[tokio::test]
    async fn test_spot_single_short_page() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            &spot_batch(3, 0),
        )]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 3);

        let requests = transport.recorded();
        assert_eq!(requests.len(), 1);
        let url = &requests[0].url;
        assert!(url.starts_with("https://gate.test/api/v4/spot/open_orders?"));
        assert!(url.contains("account=unified"));
        assert!(url.contains("limit=100"));
        assert!(url.contains("page=1"));

        let header = |name: &str| {
            requests[0]
                .headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(header("KEY").as_deref(), Some("gate_key"));
        assert!(header("SIGN").is_some());
        assert!(header("Timestamp").is_some());
    }

    #[tokio::test]
    async fn test_spot_paginates_until_short_batch() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::reply(200, &spot_batch(100, 0)),
            ScriptedTransport::reply(200, &spot_batch(100, 100)),
            ScriptedTransport::reply(200, &spot_batch(5, 200)),
        ]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 205);

        let requests = transport.recorded();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].url.contains("page=1"));
        assert!(requests[1].url.contains("page=2"));
        assert!(requests[2].url.contains("page=3"));
    }

    #[tokio::test]
    async fn test_spot_full_page_then_empty_page() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::reply(200, &spot_batch(100, 0)),
            ScriptedTransport::reply(200, "[]"),
        ]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 100);
        assert_eq!(transport.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_spot_object_envelope_with_orders_key() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"orders":[{"id":"1"},{"id":"2"}]}"#,
        )]));
        let orders = adapter(transport)
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn test_spot_object_envelope_without_orders_key_is_empty() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"total":0}"#,
        )]));
        let orders = adapter(transport)
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_spot_drops_non_object_elements() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"[{"id":"1"},"junk",7,{"id":"2"}]"#,
        )]));
        let orders = adapter(transport)
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn test_spot_scalar_body_is_protocol_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200, "\"oops\"",
        )]));
        let err = adapter(transport)
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Protocol { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_futures_listing_path_and_params() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"[{"id":9,"contract":"BTC_USDT"}]"#,
        )]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::GateFutures, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);

        let url = &transport.recorded()[0].url;
        assert!(url.starts_with("https://gate.test/api/v4/futures/usdt/orders?"));
        assert!(url.contains("status=open"));
    }

    #[tokio::test]
    async fn test_futures_object_envelope_is_protocol_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"orders":[]}"#,
        )]));
        let err = adapter(transport)
            .fetch_open_orders(Source::GateFutures, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_foreign_source() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = adapter(transport)
            .fetch_open_orders(Source::OkxSpot, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedSource(Source::OkxSpot)));
    }

    #[tokio::test]
    async fn test_non_2xx_listing_is_protocol_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            401,
            r#"{"label":"INVALID_KEY"}"#,
        )]));
        let err = adapter(transport)
            .fetch_open_orders(Source::GateSpot, &credential())
            .await
            .unwrap_err();
        match err {
            AdapterError::Protocol { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("INVALID_KEY"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spot_cancel_addresses_order_by_path() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"id":"77","status":"cancelled"}"#,
        )]));
        let receipt = adapter(transport.clone())
            .cancel_order(Source::GateSpot, "BTC_USDT", Some("77"), &credential())
            .await
            .unwrap();
        assert!(receipt.ok);

        let request = &transport.recorded()[0];
        assert_eq!(request.method, Method::Delete);
        assert!(request
            .url
            .starts_with("https://gate.test/api/v4/spot/orders/77?"));
        assert!(request.url.contains("currency_pair=BTC_USDT"));
        assert!(request.url.contains("account=unified"));
    }

    #[tokio::test]
    async fn test_futures_cancel_without_symbol_has_no_query() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200, "{}",
        )]));
        adapter(transport.clone())
            .cancel_order(Source::GateFutures, "", Some("55"), &credential())
            .await
            .unwrap();
        assert_eq!(
            transport.recorded()[0].url,
            "https://gate.test/api/v4/futures/usdt/orders/55"
        );
    }

    #[tokio::test]
    async fn test_cancel_requires_order_id() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = adapter(transport)
            .cancel_order(Source::GateSpot, "BTC_USDT", None, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingIdentifier));
    }

    #[tokio::test]
    async fn test_spot_cancel_requires_symbol() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = adapter(transport)
            .cancel_order(Source::GateSpot, "", Some("77"), &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingSymbol));
    }

    #[tokio::test]
    async fn test_cancel_non_2xx_receipt_not_ok() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            404,
            r#"{"label":"ORDER_NOT_FOUND"}"#,
        )]));
        let receipt = adapter(transport)
            .cancel_order(Source::GateFutures, "BTC_USDT", Some("55"), &credential())
            .await
            .unwrap();
        assert!(!receipt.ok);
        assert_eq!(receipt.status, 404);
    }

    #[tokio::test]
    async fn test_fetch_order_returns_object() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"id":"77","status":"open"}"#,
        )]));
        let order = adapter(transport.clone())
            .fetch_order(Source::GateSpot, "BTC_USDT", Some("77"), &credential())
            .await
            .unwrap();
        assert_eq!(order["id"], "77");
        assert_eq!(transport.recorded()[0].method, Method::Get);
    }

    #[tokio::test]
    async fn test_fetch_order_array_body_is_protocol_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200, "[]",
        )]));
        let err = adapter(transport)
            .fetch_order(Source::GateFutures, "BTC_USDT", Some("55"), &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Protocol { .. }));
    }
}
