//! Record filtering
//!
//! Criteria are compiled once per pass (the URL wildcard becomes a regex) and then evaluated
//! against each record. Filtering is order preserving and borrows the input.

use regex::Regex;
use tracing::{debug, warn};

use crate::models::{FilterCriteria, RequestRecord};

/// Evaluate criteria against a single record.
pub trait RecordFilterExt {
    fn matches(&self, record: &RequestRecord) -> bool;
}

impl RecordFilterExt for FilterCriteria {
    fn matches(&self, record: &RequestRecord) -> bool {
        CompiledFilter::new(self).matches(record)
    }
}

/// Translate a `*` wildcard pattern into an unanchored regular expression.
///
/// Everything except `*` is matched literally.
pub fn wildcard_to_regex(pattern: &str) -> String {
    pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*")
}

#[derive(Debug)]
enum UrlMatcher {
    Pattern(Regex),
    /// Used only when the translated pattern exceeds the regex size limit; the `*`-separated
    /// pieces must appear in order
    Pieces(Vec<String>),
}

impl UrlMatcher {
    fn compile(pattern: &str) -> Self {
        match Regex::new(&wildcard_to_regex(pattern)) {
            Ok(regex) => UrlMatcher::Pattern(regex),
            Err(err) => {
                warn!("url pattern {:?} could not be compiled ({}), matching literally", pattern, err);
                UrlMatcher::Pieces(pattern.split('*').map(str::to_string).collect())
            }
        }
    }

    fn is_match(&self, url: &str) -> bool {
        match self {
            UrlMatcher::Pattern(regex) => regex.is_match(url),
            UrlMatcher::Pieces(pieces) => pieces_in_order(pieces, url),
        }
    }
}

fn pieces_in_order(pieces: &[String], url: &str) -> bool {
    let mut rest = url;
    for piece in pieces {
        match rest.find(piece.as_str()) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    true
}

/// Criteria prepared for repeated evaluation
#[derive(Debug)]
pub struct CompiledFilter<'c> {
    criteria: &'c FilterCriteria,
    url: Option<UrlMatcher>,
}

impl<'c> CompiledFilter<'c> {
    pub fn new(criteria: &'c FilterCriteria) -> Self {
        let url = criteria
            .url_pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(UrlMatcher::compile);
        Self { criteria, url }
    }

    pub fn matches(&self, record: &RequestRecord) -> bool {
        let c = self.criteria;

        if !c.method.is_empty() && !c.method.contains(&record.method) {
            return false;
        }

        if let Some(url) = &self.url {
            if !url.is_match(&record.url) {
                return false;
            }
        }

        if !c.domains.is_empty() {
            // Malformed URLs have no host and never satisfy a domain constraint.
            match record.host() {
                Some(host) if c.domains.contains(host) => {}
                _ => return false,
            }
        }

        if !c.cache_control.is_empty()
            && !c
                .cache_control
                .iter()
                .any(|m| m.matches(record.cache_control_raw.as_deref()))
        {
            return false;
        }

        if !c.x_cache.is_empty() && !c.x_cache.iter().any(|m| m.matches(record.x_cache.as_deref())) {
            return false;
        }

        if let Some(pop) = c.cf_pop.as_deref().filter(|p| !p.is_empty()) {
            if record.cf_pop.as_deref() != Some(pop) {
                return false;
            }
        }

        if let Some(used) = c.cache_used.as_deref().filter(|u| !u.is_empty()) {
            if record.cache_used().as_str() != used {
                return false;
            }
        }

        if !c.cache_rank.is_empty() && !c.cache_rank.contains(&record.cache_rank().rank) {
            return false;
        }

        true
    }
}

/// Keep the records that satisfy `criteria`, in their original order.
pub fn apply_filter<'r, I>(records: I, criteria: &FilterCriteria) -> Vec<&'r RequestRecord>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let compiled = CompiledFilter::new(criteria);
    let mut total = 0usize;
    let kept: Vec<_> = records
        .into_iter()
        .inspect(|_| total += 1)
        .filter(|record| compiled.matches(record))
        .collect();
    debug!("filter kept {} of {} records", kept.len(), total);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Ingestor;
    use crate::models::{HeaderMatch, RawRecord};

    fn record(method: &str, url: &str, cache_control: Option<&str>, x_cache: Option<&str>) -> RequestRecord {
        Ingestor::default().normalize(RawRecord {
            method: Some(method.to_string()),
            url: Some(url.to_string()),
            cache_control_raw: cache_control.map(str::to_string),
            x_cache: x_cache.map(str::to_string),
            status: Some(200.0),
            timestamp_ms: Some(serde_json::json!(1_700_000_000_000i64)),
            ..Default::default()
        })
    }

    fn sample() -> Vec<RequestRecord> {
        vec![
            record("GET", "https://cdn.example.com/a.js", Some("public, max-age=600"), Some("Hit")),
            record("POST", "https://cdn.example.com/api", None, Some("Hit")),
            record("GET", "https://example.org/a.js", None, Some("Miss")),
            record("GET", "not a url", None, None),
        ]
    }

    #[test]
    fn empty_criteria_keeps_everything() {
        let records = sample();
        assert_eq!(apply_filter(&records, &FilterCriteria::default()).len(), records.len());
        assert!(apply_filter(&Vec::<RequestRecord>::new(), &FilterCriteria::default()).is_empty());
    }

    #[test]
    fn fields_combine_by_and() {
        let records = sample();
        let criteria = FilterCriteria {
            method: ["GET".to_string()].into(),
            x_cache: [HeaderMatch::from("Hit")].into(),
            ..Default::default()
        };
        let kept = apply_filter(&records, &criteria);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://cdn.example.com/a.js");
    }

    #[test]
    fn set_values_combine_by_or() {
        let records = sample();
        let criteria = FilterCriteria {
            method: ["GET".to_string(), "POST".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(apply_filter(&records, &criteria).len(), 4);
    }

    #[test]
    fn absent_sentinel_matches_missing_header_only() {
        let records = sample();
        let none = FilterCriteria {
            cache_control: [HeaderMatch::Absent].into(),
            ..Default::default()
        };
        let kept = apply_filter(&records, &none);
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.cache_control_raw.is_none()));

        let public = FilterCriteria {
            cache_control: [HeaderMatch::from("public")].into(),
            ..Default::default()
        };
        assert!(!public.matches(&records[1]));
    }

    #[test]
    fn literal_none_header_is_not_absent() {
        let r = record("GET", "https://a.test/", Some("None"), None);
        let none = FilterCriteria {
            cache_control: [HeaderMatch::Absent].into(),
            ..Default::default()
        };
        assert!(!none.matches(&r));
        let literal = FilterCriteria {
            cache_control: [HeaderMatch::Present("None".into())].into(),
            ..Default::default()
        };
        assert!(literal.matches(&r));
    }

    #[test]
    fn malformed_url_never_matches_domain_filter() {
        let records = sample();
        let criteria = FilterCriteria {
            domains: ["cdn.example.com".to_string(), "example.org".to_string()].into(),
            ..Default::default()
        };
        let kept = apply_filter(&records, &criteria);
        assert_eq!(kept.len(), 3);
        assert!(!criteria.matches(&records[3]));
    }

    #[test]
    fn wildcard_pattern_matches_unanchored() {
        let criteria = FilterCriteria {
            url_pattern: Some("*.example.com/*".into()),
            ..Default::default()
        };
        assert!(criteria.matches(&record("GET", "https://cdn.example.com/a.js", None, None)));
        assert!(!criteria.matches(&record("GET", "https://example.org/a.js", None, None)));

        let suffix = FilterCriteria {
            url_pattern: Some("*.png".into()),
            ..Default::default()
        };
        assert!(suffix.matches(&record("GET", "https://a.test/img/logo.png?v=2", None, None)));
        assert!(!suffix.matches(&record("GET", "https://a.test/img/logopng", None, None)));

        let bare = FilterCriteria {
            url_pattern: Some("api".into()),
            ..Default::default()
        };
        assert!(bare.matches(&record("POST", "https://cdn.example.com/api", None, None)));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert_eq!(wildcard_to_regex("a.b*c?"), r"a\.b.*c\?");
        let criteria = FilterCriteria {
            url_pattern: Some("/v1/(x)+".into()),
            ..Default::default()
        };
        assert!(criteria.matches(&record("GET", "https://a.test/v1/(x)+/y", None, None)));
        assert!(!criteria.matches(&record("GET", "https://a.test/v1/xx/y", None, None)));
    }

    #[test]
    fn oversized_pattern_fallback_keeps_wildcard_meaning() {
        let matcher = UrlMatcher::Pieces(vec!["a".into(), "b".into()]);
        assert!(matcher.is_match("https://x.test/a/then/b"));
        assert!(matcher.is_match("ab"));
        assert!(!matcher.is_match("https://x.test/b/then/a"));

        let suffix = UrlMatcher::Pieces(vec![String::new(), ".png".into()]);
        assert!(suffix.is_match("https://x.test/logo.png"));
        assert!(!suffix.is_match("https://x.test/logo.jpg"));
    }

    #[test]
    fn filters_on_rank_pop_and_usage() {
        let records = sample();
        let hits = FilterCriteria {
            cache_rank: ["Edge Hit".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(apply_filter(&records, &hits).len(), 2);

        let used = FilterCriteria {
            cache_used: Some("edge-miss".into()),
            ..Default::default()
        };
        assert_eq!(apply_filter(&records, &used).len(), 1);

        let pop = FilterCriteria {
            cf_pop: Some("FRA56-C1".into()),
            ..Default::default()
        };
        assert!(apply_filter(&records, &pop).is_empty());
    }

    #[test]
    fn filtering_preserves_order_and_input() {
        let records = sample();
        let before = records.clone();
        let criteria = FilterCriteria {
            method: ["GET".to_string()].into(),
            ..Default::default()
        };
        let kept: Vec<_> = apply_filter(&records, &criteria).into_iter().map(|r| r.url.as_str()).collect();
        assert_eq!(kept, vec!["https://cdn.example.com/a.js", "https://example.org/a.js", "not a url"]);
        assert_eq!(records, before);
    }
}
