//! Request record model
//!
//! A `RequestRecord` is one recorded request/response pair after ingestion. The raw header
//! fields are kept verbatim; the parsed directives, usage label and rank are derived once
//! when the record is built and never recomputed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CacheUsage;

/// Structured view of a `Cache-Control` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCacheControl {
    pub public: bool,
    pub private: bool,
    pub max_age: Option<i64>,
    #[serde(alias = "s-max-age")]
    pub s_max_age: Option<i64>,
    pub no_cache: bool,
    pub no_store: bool,
}

impl ParsedCacheControl {
    /// Who may store the response: `public`, `private` or `unspecified`
    pub fn visibility(&self) -> &'static str {
        if self.public {
            "public"
        } else if self.private {
            "private"
        } else {
            "unspecified"
        }
    }

    /// Whether the response may be reused: `no-cache`, `no-store` or `cache`
    pub fn cacheability(&self) -> &'static str {
        if self.no_cache {
            "no-cache"
        } else if self.no_store {
            "no-store"
        } else {
            "cache"
        }
    }

    /// True when the directives forbid serving a stored copy without revalidation
    pub fn forbids_caching(&self) -> bool {
        self.no_cache || self.no_store
    }
}

/// Rank assigned to a record by the rank table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheRank {
    pub rank: String,
    pub color: String,
}

/// One ingested request. Field names on the wire are part of the export contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub cache_control_raw: Option<String>,
    pub x_cache: Option<String>,
    pub cf_pop: Option<String>,
    pub time_ms: f64,
    pub size_bytes: u64,
    pub status: u16,
    pub fulfilled_by: Option<String>,
    /// Epoch milliseconds, always a real instant
    pub timestamp_ms: i64,
    pub(crate) parsed_cache_control: ParsedCacheControl,
    pub(crate) cache_used: CacheUsage,
    #[serde(skip)]
    pub(crate) cache_rank: CacheRank,
    #[serde(skip)]
    pub(crate) host: Option<String>,
}

impl RequestRecord {
    pub fn parsed_cache_control(&self) -> &ParsedCacheControl {
        &self.parsed_cache_control
    }

    pub fn cache_used(&self) -> CacheUsage {
        self.cache_used
    }

    pub fn cache_rank(&self) -> &CacheRank {
        &self.cache_rank
    }

    /// Hostname of `url`, `None` when the URL does not parse
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Response size in kilobytes
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Record as it arrives from an export file, before normalization.
///
/// Derived fields (`parsedCacheControl`, `cacheUsed`) are ignored on input and recomputed.
/// The numbered keys of older exports are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(alias = "1.method")]
    pub method: Option<String>,
    #[serde(alias = "2.url")]
    pub url: Option<String>,
    #[serde(alias = "3.cache-control")]
    pub cache_control_raw: Option<String>,
    #[serde(alias = "4.x-cache")]
    pub x_cache: Option<String>,
    #[serde(alias = "5.x-amz-cf-pop")]
    pub cf_pop: Option<String>,
    #[serde(alias = "5.time")]
    pub time_ms: Option<f64>,
    #[serde(alias = "6.size")]
    pub size_bytes: Option<f64>,
    /// Any JSON number; exports written by other tools may carry `200.0`
    #[serde(alias = "7.status")]
    pub status: Option<f64>,
    #[serde(alias = "8.fulfilledBy")]
    pub fulfilled_by: Option<String>,
    /// Number of epoch milliseconds or an RFC 3339 string
    #[serde(alias = "9.timestamp")]
    pub timestamp_ms: Option<Value>,
}
