//! Grouped totals behind the dashboard bar charts and the filter option lists.

use std::collections::HashMap;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{RankTable, ValueMode};
use crate::models::{RequestRecord, ABSENT_SENTINEL};

/// Attribute a breakdown groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    XCache,
    Pop,
    FileType,
    Domain,
    CacheRank,
    CacheUsed,
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x-cache" | "xcache" => Ok(GroupKey::XCache),
            "pop" | "cf-pop" => Ok(GroupKey::Pop),
            "file-type" | "type" => Ok(GroupKey::FileType),
            "domain" => Ok(GroupKey::Domain),
            "cache-rank" | "rank" => Ok(GroupKey::CacheRank),
            "cache-used" | "usage" => Ok(GroupKey::CacheUsed),
            other => Err(format!("unknown group key `{other}`")),
        }
    }
}

static FILE_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let groups: [(&str, &[&str]); 7] = [
        ("image", &["png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico", "bmp"]),
        ("script", &["js", "mjs", "cjs"]),
        ("stylesheet", &["css"]),
        ("font", &["woff", "woff2", "ttf", "otf", "eot"]),
        ("document", &["html", "htm", "xhtml"]),
        ("json", &["json", "map"]),
        ("media", &["mp4", "webm", "mp3", "m4a", "ogg", "m3u8", "ts", "m4s", "mpd"]),
    ];
    groups
        .into_iter()
        .flat_map(|(kind, exts)| exts.iter().map(move |ext| (*ext, kind)))
        .collect()
});

/// Coarse content category from the URL path extension
pub fn file_type(url: &str) -> &'static str {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let last = path.rsplit('/').next().unwrap_or_default();
    last.rsplit_once('.')
        .and_then(|(_, ext)| FILE_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or("other")
}

fn group_of(record: &RequestRecord, key: GroupKey) -> Option<String> {
    let header = |value: &Option<String>| value.clone().unwrap_or_else(|| ABSENT_SENTINEL.to_string());
    match key {
        GroupKey::XCache => Some(header(&record.x_cache)),
        GroupKey::Pop => Some(header(&record.cf_pop)),
        GroupKey::FileType => Some(file_type(&record.url).to_string()),
        GroupKey::Domain => record.host().map(str::to_string),
        GroupKey::CacheRank => Some(record.cache_rank().rank.clone()),
        GroupKey::CacheUsed => Some(record.cache_used().to_string()),
    }
}

/// Total per group, largest first, ties by group name.
///
/// Records whose URL has no host are left out of domain breakdowns.
pub fn breakdown<'r, I>(records: I, key: GroupKey, mode: ValueMode) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let mut totals: HashMap<String, f64> = HashMap::new();
    for record in records {
        if let Some(group) = group_of(record, key) {
            *totals.entry(group).or_insert(0.0) += mode.value_of(record);
        }
    }
    let mut out: Vec<(String, f64)> = totals.into_iter().collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Per-rank totals for one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRanks {
    pub domain: String,
    pub total: f64,
    pub per_rank: IndexMap<String, f64>,
}

/// The `top_n` domains by total, each split by rank.
pub fn domain_rank_matrix<'r, I>(records: I, ranks: &RankTable, top_n: usize, mode: ValueMode) -> Vec<DomainRanks>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let mut domains: HashMap<&str, DomainRanks> = HashMap::new();
    for record in records {
        let Some(host) = record.host() else {
            continue;
        };
        let entry = domains.entry(host).or_insert_with(|| DomainRanks {
            domain: host.to_string(),
            total: 0.0,
            per_rank: ranks.labels().map(|label| (label.to_string(), 0.0)).collect(),
        });
        let value = mode.value_of(record);
        entry.total += value;
        *entry
            .per_rank
            .entry(record.cache_rank().rank.clone())
            .or_insert(0.0) += value;
    }

    let mut out: Vec<DomainRanks> = domains.into_values().collect();
    out.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.domain.cmp(&b.domain)));
    out.truncate(top_n);
    out
}

/// Distinct values present in a collection, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub methods: IndexSet<String>,
    pub domains: IndexSet<String>,
    pub cache_controls: IndexSet<String>,
    pub x_caches: IndexSet<String>,
    pub cache_ranks: IndexSet<String>,
}

/// Collect the option lists a filter UI offers for `records`.
pub fn facets<'r, I>(records: I) -> Facets
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let mut facets = Facets::default();
    for record in records {
        facets.methods.insert(record.method.clone());
        if let Some(host) = record.host() {
            facets.domains.insert(host.to_string());
        }
        if let Some(cc) = &record.cache_control_raw {
            facets.cache_controls.insert(cc.clone());
        }
        if let Some(xc) = &record.x_cache {
            facets.x_caches.insert(xc.clone());
        }
        facets.cache_ranks.insert(record.cache_rank().rank.clone());
    }
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Ingestor;
    use crate::models::RawRecord;

    fn record(url: &str, x_cache: Option<&str>, pop: Option<&str>, size: f64) -> RequestRecord {
        Ingestor::default().normalize(RawRecord {
            method: Some("GET".into()),
            url: Some(url.into()),
            x_cache: x_cache.map(str::to_string),
            cf_pop: pop.map(str::to_string),
            size_bytes: Some(size),
            status: Some(200.0),
            timestamp_ms: Some(serde_json::json!(1_700_000_000_000i64)),
            ..Default::default()
        })
    }

    fn sample() -> Vec<RequestRecord> {
        vec![
            record("https://cdn.example.com/app.js", Some("Hit from cloudfront"), Some("FRA56"), 2048.0),
            record("https://cdn.example.com/logo.PNG?v=1", Some("Hit from cloudfront"), Some("FRA56"), 1024.0),
            record("https://api.example.com/v1/items", Some("Miss from cloudfront"), Some("AMS1"), 512.0),
            record("https://example.org/", None, None, 4096.0),
            record("::garbage::", None, None, 10.0),
        ]
    }

    #[test]
    fn file_types_come_from_the_path_extension() {
        assert_eq!(file_type("https://a.test/app.min.js?x=1"), "script");
        assert_eq!(file_type("https://a.test/logo.PNG"), "image");
        assert_eq!(file_type("https://a.test/fonts/a.woff2#f"), "font");
        assert_eq!(file_type("https://a.test/"), "other");
        assert_eq!(file_type("https://a.test/v1.2/items"), "other");
        assert_eq!(file_type("relative/style.css?q"), "stylesheet");
    }

    #[test]
    fn breakdown_groups_absent_headers_under_none() {
        let records = sample();
        let by_cache = breakdown(&records, GroupKey::XCache, ValueMode::Count);
        assert_eq!(
            by_cache,
            vec![
                ("Hit from cloudfront".to_string(), 2.0),
                ("None".to_string(), 2.0),
                ("Miss from cloudfront".to_string(), 1.0),
            ]
        );
        let by_pop = breakdown(&records, GroupKey::Pop, ValueMode::Size);
        assert_eq!(by_pop[0], ("None".to_string(), 4106.0 / 1024.0));
    }

    #[test]
    fn domain_breakdown_skips_malformed_urls() {
        let records = sample();
        let by_domain = breakdown(&records, GroupKey::Domain, ValueMode::Count);
        let total: f64 = by_domain.iter().map(|(_, v)| v).sum();
        assert_eq!(total, 4.0);
        assert_eq!(by_domain[0].0, "cdn.example.com");
    }

    #[test]
    fn domain_matrix_keeps_top_n_with_all_ranks() {
        let records = sample();
        let table = RankTable::default();
        let matrix = domain_rank_matrix(&records, &table, 2, ValueMode::Size);
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0].domain, "example.org");
        assert_eq!(matrix[1].domain, "cdn.example.com");
        assert_eq!(matrix[1].per_rank["Edge Hit"], 3.0);
        assert_eq!(matrix[1].per_rank.len(), table.len());
    }

    #[test]
    fn facets_are_distinct_in_first_seen_order() {
        let records = sample();
        let facets = facets(&records);
        assert_eq!(facets.methods.len(), 1);
        assert_eq!(
            facets.domains.iter().collect::<Vec<_>>(),
            vec!["cdn.example.com", "api.example.com", "example.org"]
        );
        assert_eq!(facets.x_caches.len(), 2);
        assert!(facets.cache_controls.is_empty());
        assert_eq!(facets.cache_ranks.first().map(String::as_str), Some("Edge Hit"));
    }

    #[test]
    fn group_keys_parse() {
        assert_eq!("x-cache".parse::<GroupKey>(), Ok(GroupKey::XCache));
        assert_eq!("RANK".parse::<GroupKey>(), Ok(GroupKey::CacheRank));
        assert!("colour".parse::<GroupKey>().is_err());
    }
}
