//! Request signing for the three exchange families.
//!
//! Uses the `ring` crate for constant-time HMAC computation. Secrets are
//! never logged or included in error messages. Every function takes the
//! timestamp explicitly, so identical inputs always produce identical
//! signatures.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use ring::{digest, hmac};

/// Characters percent-encoded in query values: everything except
/// alphanumerics and `-_.~` (the reserved set Binance leaves unescaped).
const QUERY_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode one query key or value, leaving `-_.~` unescaped.
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE_SET).to_string()
}

/// Serialize parameters sorted ascending by key, percent-encoded.
///
/// This is the exact byte string Binance signs; the sort makes the
/// serialization deterministic regardless of insertion order.
pub fn build_sorted_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", encode_query_component(k), encode_query_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sign a Binance REST API request.
///
/// Binance signs the query string: `HMAC-SHA256(secret, query_string)`.
/// The resulting lowercase-hex signature is appended as `&signature=...`.
pub fn sign_binance_request(secret: &str, query_string: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let signature = hmac::sign(&key, query_string.as_bytes());
    hex::encode(signature.as_ref())
}

/// SHA-512 of a request body, lowercase hex.
///
/// Gate hashes the exact bytes sent; an empty body hashes the empty
/// string.
pub fn sha512_hex(body: &str) -> String {
    hex::encode(digest::digest(&digest::SHA512, body.as_bytes()).as_ref())
}

/// Sign a Gate.io v4 REST API request.
///
/// Gate signs the canonical payload
/// `METHOD\nPATH\nQUERY\nSHA512(BODY)\nUNIX_SECONDS` with HMAC-SHA512,
/// rendered as lowercase hex and sent in the `SIGN` header.
pub fn sign_gate_request(
    secret: &str,
    method: &str,
    path: &str,
    query: &str,
    body: &str,
    timestamp_s: i64,
) -> String {
    let payload = format!(
        "{}\n{}\n{}\n{}\n{}",
        method,
        path,
        query,
        sha512_hex(body),
        timestamp_s
    );
    let key = hmac::Key::new(hmac::HMAC_SHA512, secret.as_bytes());
    let signature = hmac::sign(&key, payload.as_bytes());
    hex::encode(signature.as_ref())
}

/// Sign an OKX v5 REST API request.
///
/// OKX signs `timestamp + METHOD + requestPath + body` (requestPath
/// includes the query string when present) with HMAC-SHA256, rendered as
/// base64 and sent in the `OK-ACCESS-SIGN` header.
pub fn sign_okx_request(
    secret: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> String {
    let payload = format!("{timestamp}{method}{request_path}{body}");
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let signature = hmac::sign(&key, payload.as_bytes());
    BASE64.encode(signature.as_ref())
}

/// Render the OKX timestamp: ISO-8601 UTC with millisecond precision and
/// a literal `Z` suffix (e.g. `2024-01-01T00:00:00.123Z`).
pub fn okx_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
