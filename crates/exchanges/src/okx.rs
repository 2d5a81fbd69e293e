//! OKX v5 REST adapter.
//!
//! OKX signs `timestamp + METHOD + requestPath + body` (the request path
//! includes the query string) with HMAC-SHA256 rendered as base64, and
//! authenticates with four `OK-ACCESS-*` headers including a passphrase.
//! Every response is an envelope object with `code`, `msg`, and `data`;
//! `code` of `""` or `"0"` means success. All three sources share one
//! host, differing only in the `instType` parameter.

use std::sync::Arc;

use tracing::debug;

use od_core::config::OkxConfig;
use od_core::error::AdapterError;
use od_core::types::{CancelReceipt, Credential, RawOrder, Source};

use crate::signing::{build_sorted_query, okx_timestamp, sign_okx_request};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Page size for the pending-orders listing.
const PAGE_LIMIT: usize = 100;

/// Hard cap on pagination rounds. The cursor comes from response data,
/// so a misbehaving venue could otherwise loop forever.
const MAX_PAGES: usize = 20;

/// OKX REST adapter.
pub struct OkxAdapter {
    base_url: String,
    simulated_trading: bool,
    transport: Arc<dyn Transport>,
}

/// Decoded OKX envelope: success flag, code, message, and `data`.
struct Envelope {
    ok: bool,
    code: String,
    msg: String,
    data: serde_json::Value,
}

/// Decode the envelope object. Non-object bodies are protocol errors.
fn parse_envelope(status: u16, body: &str) -> Result<Envelope, AdapterError> {
    let parsed: serde_json::Value =
        serde_json::from_str(body).map_err(|_| AdapterError::protocol(status, body))?;
    let serde_json::Value::Object(map) = parsed else {
        return Err(AdapterError::protocol(status, body));
    };
    let field = |name: &str| match map.get(name) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let code = field("code");
    let msg = field("msg");
    let data = map.get("data").cloned().unwrap_or(serde_json::Value::Null);
    Ok(Envelope {
        ok: code.is_empty() || code == "0",
        code,
        msg,
        data,
    })
}

/// Whether a per-order `sCode` value reports success.
fn s_code_ok(item: &serde_json::Value) -> bool {
    match item.get("sCode") {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            trimmed.is_empty() || trimmed == "0"
        }
        Some(serde_json::Value::Number(n)) => n.as_i64() == Some(0),
        Some(_) => false,
    }
}

impl OkxAdapter {
    /// Create an adapter over the given endpoint and transport.
    pub fn new(config: &OkxConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            simulated_trading: config.simulated_trading,
            transport,
        }
    }

    /// Sign and send one request. GET requests never carry a body; the
    /// signed request path includes the sorted query string.
    async fn request_private(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
        body: Option<String>,
        credential: &Credential,
    ) -> Result<HttpResponse, AdapterError> {
        let query = build_sorted_query(&params);
        let request_path = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };

        let body = match method {
            Method::Get => None,
            _ => body,
        };
        let body_str = body.as_deref().unwrap_or("");
        let timestamp = okx_timestamp(chrono::Utc::now());
        let signature = sign_okx_request(
            &credential.api_secret,
            &timestamp,
            &method.to_string(),
            &request_path,
            body_str,
        );

        let mut headers = vec![
            ("OK-ACCESS-KEY".to_string(), credential.api_key.clone()),
            ("OK-ACCESS-SIGN".to_string(), signature),
            ("OK-ACCESS-TIMESTAMP".to_string(), timestamp),
            (
                "OK-ACCESS-PASSPHRASE".to_string(),
                credential.passphrase().to_string(),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        if self.simulated_trading {
            headers.push(("x-simulated-trading".to_string(), "1".to_string()));
        }

        debug!(method = %method, path, "okx signed request");

        self.transport
            .send(HttpRequest {
                method,
                url: format!("{}{}", self.base_url.trim_end_matches('/'), request_path),
                headers,
                body,
            })
            .await
    }

    /// Fetch all pending orders for one source, walking the `after`
    /// cursor in pages of 100.
    ///
    /// The loop stops on a short batch, a missing or non-advancing
    /// cursor, or after [`MAX_PAGES`] rounds.
    pub async fn fetch_open_orders(
        &self,
        source: Source,
        credential: &Credential,
    ) -> Result<Vec<RawOrder>, AdapterError> {
        let inst_type = source
            .okx_inst_type()
            .ok_or(AdapterError::UnsupportedSource(source))?;

        let mut orders = Vec::new();
        let mut after: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut params = vec![
                ("instType".to_string(), inst_type.to_string()),
                ("limit".to_string(), PAGE_LIMIT.to_string()),
            ];
            if let Some(cursor) = &after {
                params.push(("after".to_string(), cursor.clone()));
            }
            let resp = self
                .request_private(
                    Method::Get,
                    "/api/v5/trade/orders-pending",
                    params,
                    None,
                    credential,
                )
                .await?;
            if !resp.is_success() {
                return Err(AdapterError::protocol(resp.status, &resp.body));
            }
            let envelope = parse_envelope(resp.status, &resp.body)?;
            if !envelope.ok {
                return Err(AdapterError::Business {
                    code: envelope.code,
                    msg: envelope.msg,
                });
            }
            let serde_json::Value::Array(items) = envelope.data else {
                return Err(AdapterError::protocol(resp.status, &resp.body));
            };
            let batch: Vec<RawOrder> =
                items.into_iter().filter(|item| item.is_object()).collect();

            let short = batch.len() < PAGE_LIMIT;
            let last_ord_id = batch
                .last()
                .and_then(|item| item.get("ordId"))
                .and_then(|id| id.as_str())
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty());
            orders.extend(batch);
            if short {
                break;
            }
            match last_ord_id {
                Some(cursor) if after.as_deref() != Some(&cursor) => after = Some(cursor),
                _ => break,
            }
        }
        Ok(orders)
    }

    /// Cancel one order via `POST /api/v5/trade/cancel-order`.
    ///
    /// The receipt is `ok` only when the HTTP status is 2xx, the envelope
    /// code is success, and every element of `data` carries a successful
    /// `sCode`. OKX reports per-order rejections inside a 2xx envelope.
    pub async fn cancel_order(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        client_order_id: Option<&str>,
        credential: &Credential,
    ) -> Result<CancelReceipt, AdapterError> {
        if source.okx_inst_type().is_none() {
            return Err(AdapterError::UnsupportedSource(source));
        }
        if symbol.is_empty() {
            return Err(AdapterError::MissingSymbol);
        }
        let mut payload = serde_json::Map::new();
        payload.insert("instId".to_string(), serde_json::Value::String(symbol.to_string()));
        match (non_empty(order_id), non_empty(client_order_id)) {
            (Some(id), _) => {
                payload.insert("ordId".to_string(), serde_json::Value::String(id.to_string()));
            }
            (None, Some(cid)) => {
                payload.insert("clOrdId".to_string(), serde_json::Value::String(cid.to_string()));
            }
            (None, None) => return Err(AdapterError::MissingIdentifier),
        }
        let body = serde_json::Value::Object(payload).to_string();

        let resp = self
            .request_private(
                Method::Post,
                "/api/v5/trade/cancel-order",
                Vec::new(),
                Some(body),
                credential,
            )
            .await?;

        let accepted = resp.is_success()
            && match parse_envelope(resp.status, &resp.body) {
                Ok(envelope) => {
                    envelope.ok
                        && match &envelope.data {
                            serde_json::Value::Array(items) => items.iter().all(s_code_ok),
                            _ => true,
                        }
                }
                Err(_) => false,
            };
        Ok(CancelReceipt {
            ok: accepted,
            status: resp.status,
            body: resp.body,
        })
    }

    /// Look up one order via `GET /api/v5/trade/order`.
    pub async fn fetch_order(
        &self,
        source: Source,
        symbol: &str,
        order_id: Option<&str>,
        client_order_id: Option<&str>,
        credential: &Credential,
    ) -> Result<RawOrder, AdapterError> {
        if source.okx_inst_type().is_none() {
            return Err(AdapterError::UnsupportedSource(source));
        }
        if symbol.is_empty() {
            return Err(AdapterError::MissingSymbol);
        }
        let mut params = vec![("instId".to_string(), symbol.to_string())];
        match (non_empty(order_id), non_empty(client_order_id)) {
            (Some(id), _) => params.push(("ordId".to_string(), id.to_string())),
            (None, Some(cid)) => params.push(("clOrdId".to_string(), cid.to_string())),
            (None, None) => return Err(AdapterError::MissingIdentifier),
        }

        let resp = self
            .request_private(Method::Get, "/api/v5/trade/order", params, None, credential)
            .await?;
        if !resp.is_success() {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        }
        let envelope = parse_envelope(resp.status, &resp.body)?;
        if !envelope.ok {
            return Err(AdapterError::Business {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        let serde_json::Value::Array(items) = envelope.data else {
            return Err(AdapterError::protocol(resp.status, &resp.body));
        };
        match items.into_iter().next() {
            Some(item) if item.is_object() => Ok(item),
            _ => Err(AdapterError::protocol(resp.status, &resp.body)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use od_core::types::Exchange;

    fn config() -> OkxConfig {
        OkxConfig {
            base_url: "https://okx.test".to_string(),
            simulated_trading: false,
        }
    }

    fn credential() -> Credential {
        Credential {
            exchange: Exchange::Okx,
            label: "main".to_string(),
            api_key: "okx_key".to_string(),
            api_secret: "okx_secret".to_string(),
            api_passphrase: Some("hunter2".to_string()),
        }
    }

    fn adapter(transport: Arc<ScriptedTransport>) -> OkxAdapter {
        OkxAdapter::new(&config(), transport)
    }

    fn pending_page(count: usize, start: usize) -> String {
        let items: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"ordId":"{}","instId":"BTC-USDT"}}"#, start + i))
            .collect();
        format!(r#"{{"code":"0","msg":"","data":[{}]}}"#, items.join(","))
    }

    #[tokio::test]
    async fn test_fetch_single_short_page() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            &pending_page(2, 0),
        )]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);

        let requests = transport.recorded();
        assert_eq!(requests.len(), 1);
        let url = &requests[0].url;
        assert!(url.starts_with("https://okx.test/api/v5/trade/orders-pending?"));
        assert!(url.contains("instType=SWAP"));
        assert!(url.contains("limit=100"));
        assert!(!url.contains("after="));

        let header = |name: &str| {
            requests[0]
                .headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(header("OK-ACCESS-KEY").as_deref(), Some("okx_key"));
        assert_eq!(header("OK-ACCESS-PASSPHRASE").as_deref(), Some("hunter2"));
        assert!(header("OK-ACCESS-SIGN").is_some());
        assert!(header("OK-ACCESS-TIMESTAMP").is_some());
        assert!(header("x-simulated-trading").is_none());
    }

    #[tokio::test]
    async fn test_inst_type_per_source() {
        for (source, inst_type) in [
            (Source::OkxSpot, "instType=SPOT"),
            (Source::OkxMargin, "instType=MARGIN"),
        ] {
            let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
                200,
                &pending_page(0, 0),
            )]));
            adapter(transport.clone())
                .fetch_open_orders(source, &credential())
                .await
                .unwrap();
            assert!(transport.recorded()[0].url.contains(inst_type));
        }
    }

    #[tokio::test]
    async fn test_fetch_paginates_with_after_cursor() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::reply(200, &pending_page(100, 0)),
            ScriptedTransport::reply(200, &pending_page(3, 100)),
        ]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 103);

        let requests = transport.recorded();
        assert_eq!(requests.len(), 2);
        // Cursor is the last ordId of the previous page.
        assert!(requests[1].url.contains("after=99"));
    }

    #[tokio::test]
    async fn test_fetch_stops_on_repeated_cursor() {
        // Full pages whose last ordId never advances.
        let page = pending_page(100, 0);
        let transport = Arc::new(ScriptedTransport::new(vec![
            ScriptedTransport::reply(200, &page),
            ScriptedTransport::reply(200, &page),
        ]));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap();
        assert_eq!(orders.len(), 200);
        assert_eq!(transport.recorded().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_capped_at_twenty_pages() {
        let responses: Vec<_> = (0..25)
            .map(|i| ScriptedTransport::reply(200, &pending_page(100, i * 100)))
            .collect();
        let transport = Arc::new(ScriptedTransport::new(responses));
        let orders = adapter(transport.clone())
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap();
        assert_eq!(transport.recorded().len(), 20);
        assert_eq!(orders.len(), 2000);
    }

    #[tokio::test]
    async fn test_fetch_business_error_from_envelope() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"50011","msg":"Rate limit reached","data":[]}"#,
        )]));
        let err = adapter(transport)
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap_err();
        match err {
            AdapterError::Business { code, msg } => {
                assert_eq!(code, "50011");
                assert_eq!(msg, "Rate limit reached");
            }
            other => panic!("expected business error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_non_array_data_is_protocol_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"0","msg":"","data":{"k":1}}"#,
        )]));
        let err = adapter(transport)
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_foreign_source() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = adapter(transport)
            .fetch_open_orders(Source::BinanceSpot, &credential())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::UnsupportedSource(Source::BinanceSpot)
        ));
    }

    #[tokio::test]
    async fn test_simulated_trading_header() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            &pending_page(0, 0),
        )]));
        let adapter = OkxAdapter::new(
            &OkxConfig {
                base_url: "https://okx.test".to_string(),
                simulated_trading: true,
            },
            transport.clone(),
        );
        adapter
            .fetch_open_orders(Source::OkxSwap, &credential())
            .await
            .unwrap();
        assert!(transport.recorded()[0]
            .headers
            .iter()
            .any(|(k, v)| k == "x-simulated-trading" && v == "1"));
    }

    #[tokio::test]
    async fn test_cancel_sends_compact_json_body() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"0","msg":"","data":[{"ordId":"42","sCode":"0"}]}"#,
        )]));
        let receipt = adapter(transport.clone())
            .cancel_order(Source::OkxSwap, "BTC-USDT-SWAP", Some("42"), None, &credential())
            .await
            .unwrap();
        assert!(receipt.ok);

        let request = &transport.recorded()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://okx.test/api/v5/trade/cancel-order");
        assert_eq!(
            request.body.as_deref(),
            Some(r#"{"instId":"BTC-USDT-SWAP","ordId":"42"}"#)
        );
    }

    #[tokio::test]
    async fn test_cancel_falls_back_to_client_order_id() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"0","msg":"","data":[]}"#,
        )]));
        adapter(transport.clone())
            .cancel_order(Source::OkxSpot, "BTC-USDT", None, Some("c-9"), &credential())
            .await
            .unwrap();
        assert_eq!(
            transport.recorded()[0].body.as_deref(),
            Some(r#"{"clOrdId":"c-9","instId":"BTC-USDT"}"#)
        );
    }

    #[tokio::test]
    async fn test_cancel_s_code_failure_is_not_ok() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"0","msg":"","data":[{"ordId":"42","sCode":"51400","sMsg":"Order already canceled"}]}"#,
        )]));
        let receipt = adapter(transport)
            .cancel_order(Source::OkxSwap, "BTC-USDT-SWAP", Some("42"), None, &credential())
            .await
            .unwrap();
        assert!(!receipt.ok);
        assert_eq!(receipt.status, 200);
        assert!(receipt.body.contains("51400"));
    }

    #[tokio::test]
    async fn test_cancel_envelope_code_failure_is_not_ok() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"1","msg":"Operation failed","data":[]}"#,
        )]));
        let receipt = adapter(transport)
            .cancel_order(Source::OkxSwap, "BTC-USDT-SWAP", Some("42"), None, &credential())
            .await
            .unwrap();
        assert!(!receipt.ok);
    }

    #[tokio::test]
    async fn test_cancel_requires_symbol_and_identifier() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let okx = adapter(transport);
        let err = okx
            .cancel_order(Source::OkxSwap, "", Some("42"), None, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingSymbol));

        let err = okx
            .cancel_order(Source::OkxSwap, "BTC-USDT-SWAP", None, None, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingIdentifier));
    }

    #[tokio::test]
    async fn test_fetch_order_takes_first_element() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"0","msg":"","data":[{"ordId":"42","state":"live"}]}"#,
        )]));
        let order = adapter(transport.clone())
            .fetch_order(Source::OkxSwap, "BTC-USDT-SWAP", Some("42"), None, &credential())
            .await
            .unwrap();
        assert_eq!(order["ordId"], "42");

        let url = &transport.recorded()[0].url;
        assert!(url.starts_with("https://okx.test/api/v5/trade/order?"));
        assert!(url.contains("instId=BTC-USDT-SWAP"));
        assert!(url.contains("ordId=42"));
    }

    #[tokio::test]
    async fn test_fetch_order_empty_data_is_protocol_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"0","msg":"","data":[]}"#,
        )]));
        let err = adapter(transport)
            .fetch_order(Source::OkxSwap, "BTC-USDT-SWAP", Some("42"), None, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_fetch_order_business_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![ScriptedTransport::reply(
            200,
            r#"{"code":"51603","msg":"Order does not exist","data":[]}"#,
        )]));
        let err = adapter(transport)
            .fetch_order(Source::OkxSwap, "BTC-USDT-SWAP", Some("42"), None, &credential())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Business { .. }));
    }

    #[test]
    fn test_s_code_ok_variants() {
        assert!(s_code_ok(&serde_json::json!({})));
        assert!(s_code_ok(&serde_json::json!({"sCode":"0"})));
        assert!(s_code_ok(&serde_json::json!({"sCode":""})));
        assert!(s_code_ok(&serde_json::json!({"sCode":0})));
        assert!(!s_code_ok(&serde_json::json!({"sCode":"51400"})));
        assert!(!s_code_ok(&serde_json::json!({"sCode":1})));
    }
}
