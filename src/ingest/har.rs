//! HAR import
//!
//! Each entry is decoded on its own so one malformed entry is skipped instead of failing the
//! whole capture.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::RawRecord;

#[derive(Deserialize)]
struct RawHar {
    log: RawHarLog,
}

#[derive(Deserialize)]
struct RawHarLog {
    entries: Vec<Value>,
}

#[derive(Deserialize)]
struct RawHarEntry {
    #[serde(rename = "startedDateTime")]
    started_datetime: Option<String>,
    time: Option<f64>,
    request: RawHarRequest,
    response: Option<RawHarResponse>,
}

#[derive(Deserialize)]
struct RawHarRequest {
    method: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct RawHarResponse {
    status: Option<f64>,
    headers: Option<Vec<HarHeader>>,
    content: Option<RawHarContent>,
    #[serde(rename = "_fulfilledBy")]
    fulfilled_by: Option<String>,
}

#[derive(Deserialize)]
struct RawHarContent {
    size: Option<f64>,
}

#[derive(Clone, Deserialize)]
struct HarHeader {
    name: String,
    value: Option<String>,
}

/// True when `value` has the `{ log: { entries: [...] } }` shape of a HAR capture
pub fn is_har(value: &Value) -> bool {
    value
        .get("log")
        .and_then(|log| log.get("entries"))
        .map_or(false, Value::is_array)
}

/// Decode the usable entries of a HAR document. Returns `None` when the log shape is wrong.
pub fn har_to_raw_records(value: Value) -> Option<Vec<RawRecord>> {
    let har: RawHar = serde_json::from_value(value).ok()?;
    let total = har.log.entries.len();
    let records: Vec<RawRecord> = har
        .log
        .entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry_to_raw(entry) {
            Ok(raw) => Some(raw),
            Err(reason) => {
                warn!("skipping HAR entry {}: {}", index, reason);
                None
            }
        })
        .collect();
    tracing::debug!("decoded {} of {} HAR entries", records.len(), total);
    Some(records)
}

fn entry_to_raw(entry: Value) -> Result<RawRecord, String> {
    let entry: RawHarEntry = serde_json::from_value(entry).map_err(|err| err.to_string())?;
    let url = entry
        .request
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "missing request url".to_string())?;

    let response = entry.response;
    let headers = response
        .as_ref()
        .and_then(|r| r.headers.clone())
        .unwrap_or_default();

    Ok(RawRecord {
        method: entry.request.method,
        url: Some(url),
        cache_control_raw: header_value(&headers, "cache-control"),
        x_cache: header_value(&headers, "x-cache"),
        cf_pop: header_value(&headers, "x-amz-cf-pop"),
        time_ms: entry.time,
        size_bytes: response
            .as_ref()
            .and_then(|r| r.content.as_ref())
            .and_then(|c| c.size),
        status: response.as_ref().and_then(|r| r.status),
        fulfilled_by: response.and_then(|r| r.fulfilled_by),
        timestamp_ms: entry.started_datetime.map(Value::String),
    })
}

fn header_value(headers: &[HarHeader], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .and_then(|h| h.value.clone())
        .filter(|v| !v.is_empty())
}
