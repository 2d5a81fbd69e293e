//! Order normalization: one exchange-specific payload in, one
//! [`OrderItem`] out.
//!
//! Field mapping is first-non-null over per-exchange key lists. Numeric
//! fields are kept as decimal strings exactly as the exchange reported
//! them; the one computed value is Gate's executed-quantity fallback,
//! `abs(size) - abs(left)`, done in decimal arithmetic so `"10" - "4"`
//! yields exactly `"6"`.

use std::str::FromStr;

use rust_decimal::Decimal;

use od_core::types::{Exchange, OrderItem, RawOrder, Source};

/// Map one raw order into the canonical model.
///
/// `id` is `exchange:source:symbol:orderKey`; the key prefers the
/// exchange order id, then the client order id, then a fresh opaque
/// token. Orders lacking both identifiers therefore get a new `id` on
/// every poll.
pub fn normalize_order(exchange: Exchange, source: Source, raw: &RawOrder) -> OrderItem {
    let keys = FieldKeys::for_exchange(exchange);

    let symbol = first_string(raw, keys.symbol)
        .map(|s| s.to_uppercase())
        .unwrap_or_default();
    let order_id = first_string(raw, keys.order_id);
    let client_order_id = first_string(raw, keys.client_order_id);

    let executed_qty = first_string(raw, keys.executed_qty)
        .or_else(|| match exchange {
            Exchange::Gate => gate_executed_fallback(raw),
            _ => None,
        });

    let order_key = order_id
        .clone()
        .or_else(|| client_order_id.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    OrderItem {
        id: format!("{exchange}:{}:{symbol}:{order_key}", source.as_str()),
        exchange,
        source,
        symbol,
        side: first_string(raw, keys.side),
        order_type: first_string(raw, keys.order_type),
        status: first_string(raw, keys.status),
        price: first_string(raw, keys.price),
        orig_qty: first_string(raw, keys.orig_qty),
        executed_qty,
        time_ms: first_timestamp(raw, keys.time),
        update_time_ms: first_timestamp(raw, keys.update_time),
        order_id,
        client_order_id,
        position_side: first_string(raw, keys.position_side),
        reduce_only: keys
            .reduce_only
            .iter()
            .find_map(|key| parse_bool(raw.get(key)?)),
    }
}

/// Per-exchange source field names, in precedence order.
struct FieldKeys {
    symbol: &'static [&'static str],
    order_id: &'static [&'static str],
    client_order_id: &'static [&'static str],
    side: &'static [&'static str],
    order_type: &'static [&'static str],
    status: &'static [&'static str],
    price: &'static [&'static str],
    orig_qty: &'static [&'static str],
    executed_qty: &'static [&'static str],
    time: &'static [&'static str],
    update_time: &'static [&'static str],
    position_side: &'static [&'static str],
    reduce_only: &'static [&'static str],
}

impl FieldKeys {
    fn for_exchange(exchange: Exchange) -> Self {
        match exchange {
            Exchange::Binance => FieldKeys {
                symbol: &["symbol"],
                order_id: &["orderId", "orderID", "order_id"],
                client_order_id: &["clientOrderId", "client_order_id"],
                side: &["side"],
                order_type: &["type"],
                status: &["status"],
                price: &["price"],
                orig_qty: &["origQty", "origQuantity"],
                executed_qty: &["executedQty"],
                time: &["time"],
                update_time: &["updateTime"],
                position_side: &["positionSide"],
                reduce_only: &["reduceOnly"],
            },
            Exchange::Okx => FieldKeys {
                symbol: &["instId"],
                order_id: &["ordId"],
                client_order_id: &["clOrdId"],
                side: &["side"],
                order_type: &["ordType"],
                status: &["state"],
                price: &["px"],
                orig_qty: &["sz"],
                executed_qty: &["accFillSz", "filledSz", "fillSz"],
                time: &["cTime"],
                update_time: &["uTime"],
                position_side: &["posSide"],
                reduce_only: &["reduceOnly"],
            },
            Exchange::Gate => FieldKeys {
                symbol: &["currency_pair", "contract"],
                order_id: &["id", "order_id"],
                client_order_id: &["text", "client_oid"],
                side: &["side"],
                order_type: &["type"],
                status: &["status"],
                price: &["price"],
                orig_qty: &["amount", "size"],
                executed_qty: &["filled_amount"],
                time: &["create_time_ms", "create_time"],
                update_time: &["update_time_ms", "update_time", "finish_time"],
                position_side: &[],
                reduce_only: &["is_reduce_only", "reduce_only"],
            },
        }
    }
}

/// First key whose value is a non-empty string or a number, rendered as
/// a string.
fn first_string(raw: &RawOrder, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(key)? {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First key that parses as a timestamp, normalized to epoch
/// milliseconds.
fn first_timestamp(raw: &RawOrder, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| parse_timestamp(raw.get(key)?))
}

/// Normalize one timestamp-like value to epoch milliseconds.
///
/// Values over 1e12 are already milliseconds; values over 1e9 are
/// seconds and get multiplied by 1000; smaller values pass through.
/// Non-numeric input yields `None`.
fn parse_timestamp(value: &serde_json::Value) -> Option<i64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    if number > 1e12 {
        Some(number as i64)
    } else if number > 1e9 {
        Some((number * 1000.0) as i64)
    } else {
        Some(number as i64)
    }
}

/// Parse a boolean-like value: native bool, numeric 0/1, or the usual
/// true/false/yes/no/1/0 strings (case-insensitive).
fn parse_bool(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Gate futures report no filled amount; derive it as
/// `abs(size) - abs(left)` when both parse as decimals.
fn gate_executed_fallback(raw: &RawOrder) -> Option<String> {
    let size = decimal_field(raw, "size")?;
    let left = decimal_field(raw, "left")?;
    Some((size.abs() - left.abs()).normalize().to_string())
}

fn decimal_field(raw: &RawOrder, key: &str) -> Option<Decimal> {
    match raw.get(key)? {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}
