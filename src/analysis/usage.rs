//! Cache usage classification
//!
//! Signals are consulted in a fixed precedence and the first one that yields a label wins:
//! the fulfilled-by tier, then the CDN `X-Cache` header, then the `Cache-Control` directives
//! together with the status code. No signal at all resolves to [`CacheUsage::Unknown`].

use serde::{Deserialize, Serialize};

use crate::models::{CacheUsage, ParsedCacheControl};

/// Case-insensitive substring that maps a header value to a usage label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePattern {
    pub contains: String,
    pub usage: CacheUsage,
}

impl UsagePattern {
    pub fn new(contains: &str, usage: CacheUsage) -> Self {
        Self {
            contains: contains.to_string(),
            usage,
        }
    }
}

/// Ordered pattern lists for the header-driven classification steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageRules {
    pub fulfilled_by: Vec<UsagePattern>,
    pub x_cache: Vec<UsagePattern>,
}

impl Default for UsageRules {
    fn default() -> Self {
        use CacheUsage::*;
        Self {
            fulfilled_by: vec![
                UsagePattern::new("service worker", ServiceWorker),
                UsagePattern::new("serviceworker", ServiceWorker),
                UsagePattern::new("memory", BrowserCache),
                UsagePattern::new("disk", BrowserCache),
                UsagePattern::new("prefetch", BrowserCache),
                UsagePattern::new("edge", EdgeHit),
                UsagePattern::new("cdn", EdgeHit),
                UsagePattern::new("origin", Origin),
                UsagePattern::new("network", Origin),
                UsagePattern::new("cache", BrowserCache),
            ],
            x_cache: vec![
                UsagePattern::new("refreshhit", EdgeRefresh),
                UsagePattern::new("hit", EdgeHit),
                UsagePattern::new("miss", EdgeMiss),
            ],
        }
    }
}

fn first_match(patterns: &[UsagePattern], value: &str) -> Option<CacheUsage> {
    let value = value.to_ascii_lowercase();
    patterns
        .iter()
        .find(|p| value.contains(&p.contains.to_ascii_lowercase()))
        .map(|p| p.usage)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl UsageRules {
    /// Classify a response. Never fails; missing signals degrade to the next step.
    pub fn classify(
        &self,
        fulfilled_by: Option<&str>,
        cache_control: &ParsedCacheControl,
        x_cache: Option<&str>,
        status: u16,
    ) -> CacheUsage {
        if let Some(usage) = non_empty(fulfilled_by).and_then(|v| first_match(&self.fulfilled_by, v)) {
            return usage;
        }
        if let Some(usage) = non_empty(x_cache).and_then(|v| first_match(&self.x_cache, v)) {
            return usage;
        }
        classify_by_directives(cache_control, status)
    }
}

fn classify_by_directives(cache_control: &ParsedCacheControl, status: u16) -> CacheUsage {
    if status == 0 {
        return CacheUsage::Unknown;
    }
    if cache_control.forbids_caching() {
        return CacheUsage::NotCacheable;
    }
    match status {
        304 => CacheUsage::Revalidated,
        200..=299 => CacheUsage::Origin,
        _ => CacheUsage::NotCacheable,
    }
}
