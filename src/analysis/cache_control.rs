//! `Cache-Control` header parsing
//!
//! Parsing is total: unknown directives are skipped and malformed numeric values become
//! `None` instead of an error.

use crate::models::ParsedCacheControl;

/// Parse a raw `Cache-Control` header value.
///
/// `None` and the empty string both yield the all-default value.
pub fn parse_cache_control(raw: Option<&str>) -> ParsedCacheControl {
    let mut parsed = ParsedCacheControl::default();
    let Some(raw) = raw else {
        return parsed;
    };

    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (name, value) = match token.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (token, None),
        };
        match name.to_ascii_lowercase().as_str() {
            "public" => parsed.public = true,
            "private" => parsed.private = true,
            "no-cache" => parsed.no_cache = true,
            "no-store" => parsed.no_store = true,
            "max-age" => parsed.max_age = value.and_then(parse_seconds),
            "s-maxage" => parsed.s_max_age = value.and_then(parse_seconds),
            _ => {}
        }
    }

    parsed
}

fn parse_seconds(value: &str) -> Option<i64> {
    value.trim_matches('"').parse::<i64>().ok()
}
