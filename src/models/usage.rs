//! Cache usage labels
//!
//! The closed set of outcomes the classifier can assign to a request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Effective cache outcome of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheUsage {
    /// Served from the browser's memory, disk or prefetch cache
    BrowserCache,
    /// Answered by a service worker
    ServiceWorker,
    /// CDN edge served a cached copy
    EdgeHit,
    /// CDN edge revalidated its copy with the origin
    EdgeRefresh,
    /// CDN edge had to go to the origin
    EdgeMiss,
    /// Conditional request answered with 304
    Revalidated,
    /// Fetched from the origin with no cache tier involved
    Origin,
    /// Response forbids caching or is not a cache candidate
    NotCacheable,
    /// No usable signal
    Unknown,
}

impl CacheUsage {
    pub const ALL: [CacheUsage; 9] = [
        CacheUsage::BrowserCache,
        CacheUsage::ServiceWorker,
        CacheUsage::EdgeHit,
        CacheUsage::EdgeRefresh,
        CacheUsage::EdgeMiss,
        CacheUsage::Revalidated,
        CacheUsage::Origin,
        CacheUsage::NotCacheable,
        CacheUsage::Unknown,
    ];

    /// Wire label used in exported records
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheUsage::BrowserCache => "browser-cache",
            CacheUsage::ServiceWorker => "service-worker",
            CacheUsage::EdgeHit => "edge-hit",
            CacheUsage::EdgeRefresh => "edge-refresh",
            CacheUsage::EdgeMiss => "edge-miss",
            CacheUsage::Revalidated => "revalidated",
            CacheUsage::Origin => "origin",
            CacheUsage::NotCacheable => "not-cacheable",
            CacheUsage::Unknown => "unknown",
        }
    }

    /// Convert from a wire label (lossy, defaults to `Unknown`)
    pub fn from_str_lossy(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|usage| usage.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(CacheUsage::Unknown)
    }
}

impl fmt::Display for CacheUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
