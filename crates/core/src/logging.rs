//! Logging and tracing initialization.
//!
//! [`init_tracing`] configures structured logging in two modes:
//! - **JSON mode** (`json = true`): machine-readable output for log
//!   aggregation in production.
//! - **Pretty mode** (`json = false`): human-readable colored output for
//!   local development.
//!
//! Both modes respect the `RUST_LOG` environment variable for filtering
//! (e.g., `RUST_LOG=od_exchanges=debug`). Adapter code logs request
//! metadata only, never query strings, bodies, or headers that carry
//! signatures or keys. [`mask_key`] renders an abbreviated API key when
//! one must be shown to the operator.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// # Panics
///
/// Panics if the global subscriber has already been set.
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        registry.with(json_layer).init();
    } else {
        let pretty_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        registry.with(pretty_layer).init();
    }
}

/// Abbreviate an API key for display: first and last four characters.
///
/// Keys of eight characters or fewer are fully masked.
pub fn mask_key(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key_long() {
        assert_eq!(mask_key("abcdefghijklmnop"), "abcd...mnop");
    }

    #[test]
    fn test_mask_key_short_fully_masked() {
        assert_eq!(mask_key("12345678"), "********");
        assert_eq!(mask_key("abc"), "***");
    }

    #[test]
    fn test_mask_key_empty() {
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_mask_key_never_leaks_middle() {
        let key = "AAAA-my-secret-middle-ZZZZ";
        let masked = mask_key(key);
        assert!(!masked.contains("secret"));
        assert!(masked.starts_with("AAAA"));
        assert!(masked.ends_with("ZZZZ"));
    }
}
