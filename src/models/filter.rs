//! Filter criteria model
//!
//! Every field is optional. An absent or empty field imposes no restriction; fields combine
//! by AND and the values inside one set combine by OR.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Wire spelling of "header not present" inside header sets
pub const ABSENT_SENTINEL: &str = "None";

/// One accepted value for a header field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HeaderMatch {
    /// The header is missing from the response
    Absent,
    /// The header is present with exactly this value
    Present(String),
}

impl HeaderMatch {
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (HeaderMatch::Absent, None) => true,
            (HeaderMatch::Present(expected), Some(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl From<String> for HeaderMatch {
    fn from(value: String) -> Self {
        if value == ABSENT_SENTINEL {
            HeaderMatch::Absent
        } else {
            HeaderMatch::Present(value)
        }
    }
}

impl From<&str> for HeaderMatch {
    fn from(value: &str) -> Self {
        HeaderMatch::from(value.to_string())
    }
}

impl From<HeaderMatch> for String {
    fn from(value: HeaderMatch) -> Self {
        match value {
            HeaderMatch::Absent => ABSENT_SENTINEL.to_string(),
            HeaderMatch::Present(value) => value,
        }
    }
}

impl From<Option<&str>> for HeaderMatch {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(v) => HeaderMatch::Present(v.to_string()),
            None => HeaderMatch::Absent,
        }
    }
}

/// Query over a record collection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    /// Accepted HTTP methods
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub method: BTreeSet<String>,
    /// Accepted hostnames
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub domains: BTreeSet<String>,
    /// URL wildcard pattern, `*` matches any run of characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_pattern: Option<String>,
    /// Accepted raw `Cache-Control` values
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub cache_control: BTreeSet<HeaderMatch>,
    /// Accepted raw `X-Cache` values
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub x_cache: BTreeSet<HeaderMatch>,
    /// Accepted rank labels
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub cache_rank: BTreeSet<String>,
    /// Exact PoP identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cf_pop: Option<String>,
    /// Exact usage label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_used: Option<String>,
}

impl FilterCriteria {
    /// True when no field restricts anything
    pub fn is_empty(&self) -> bool {
        self.method.is_empty()
            && self.domains.is_empty()
            && self.url_pattern.as_deref().map_or(true, str::is_empty)
            && self.cache_control.is_empty()
            && self.x_cache.is_empty()
            && self.cache_rank.is_empty()
            && self.cf_pop.as_deref().map_or(true, str::is_empty)
            && self.cache_used.as_deref().map_or(true, str::is_empty)
    }

    /// Merge `other` over `self`, fields set in `other` win
    pub fn merged(&self, other: &FilterCriteria) -> FilterCriteria {
        fn pick<T: Clone>(base: &BTreeSet<T>, over: &BTreeSet<T>) -> BTreeSet<T> {
            if over.is_empty() {
                base.clone()
            } else {
                over.clone()
            }
        }
        FilterCriteria {
            method: pick(&self.method, &other.method),
            domains: pick(&self.domains, &other.domains),
            url_pattern: other.url_pattern.clone().or_else(|| self.url_pattern.clone()),
            cache_control: pick(&self.cache_control, &other.cache_control),
            x_cache: pick(&self.x_cache, &other.x_cache),
            cache_rank: pick(&self.cache_rank, &other.cache_rank),
            cf_pop: other.cf_pop.clone().or_else(|| self.cf_pop.clone()),
            cache_used: other.cache_used.clone().or_else(|| self.cache_used.clone()),
        }
    }
}
