//! Record normalization
//!
//! Turns a raw record into a `RequestRecord`, deriving the parsed directives, the usage label,
//! the hostname and the rank exactly once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::analysis::{parse_cache_control, RankSubject};
use crate::config::EngineConfig;
use crate::models::{RawRecord, RequestRecord};

/// Builds normalized records using an injected engine configuration.
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    config: Arc<EngineConfig>,
}

impl Ingestor {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize one raw record. Never fails; bad fields fall back to neutral values.
    pub fn normalize(&self, raw: RawRecord) -> RequestRecord {
        let cache_control_raw = non_empty(raw.cache_control_raw);
        let x_cache = non_empty(raw.x_cache);
        let fulfilled_by = non_empty(raw.fulfilled_by);
        let status = raw.status.and_then(status_code).unwrap_or(0);

        let parsed_cache_control = parse_cache_control(cache_control_raw.as_deref());
        let cache_used = self.config.usage.classify(
            fulfilled_by.as_deref(),
            &parsed_cache_control,
            x_cache.as_deref(),
            status,
        );
        let cache_rank = self
            .config
            .ranks
            .rule_for(&RankSubject {
                usage: cache_used,
                cache_control: &parsed_cache_control,
                status,
            })
            .to_rank();

        let url = raw.url.unwrap_or_default();
        let host = url::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));

        RequestRecord {
            method: raw.method.unwrap_or_else(|| "GET".to_string()),
            url,
            cache_control_raw,
            x_cache,
            cf_pop: non_empty(raw.cf_pop),
            time_ms: raw.time_ms.filter(|t| t.is_finite()).unwrap_or(0.0).max(0.0),
            size_bytes: raw.size_bytes.filter(|s| s.is_finite()).unwrap_or(0.0).max(0.0) as u64,
            status,
            fulfilled_by,
            timestamp_ms: resolve_timestamp(raw.timestamp_ms.as_ref()),
            parsed_cache_control,
            cache_used,
            cache_rank,
            host,
        }
    }
}

fn status_code(value: f64) -> Option<u16> {
    (value.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&value)).then(|| value as u16)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Epoch milliseconds from a number or an RFC 3339 string, else the current time.
pub(crate) fn resolve_timestamp(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().and_then(valid_millis),
        Some(Value::String(s)) => parse_timestamp_str(s),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        if let Some(value) = value {
            warn!("invalid timestamp {}, using current time", value);
        }
        Utc::now().timestamp_millis()
    })
}

fn parse_timestamp_str(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    value.parse::<f64>().ok().and_then(valid_millis)
}

/// Zero counts as missing; anything outside the representable date range is rejected.
fn valid_millis(ms: f64) -> Option<i64> {
    if !ms.is_finite() || ms == 0.0 {
        return None;
    }
    let ms = ms as i64;
    DateTime::from_timestamp_millis(ms).map(|_| ms)
}
