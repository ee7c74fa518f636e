//! Cache rank evaluation
//!
//! A rank table is an ordered list of rules, best caching behaviour first. Rules are checked
//! top to bottom and the first match wins. The table always ends with a catch-all rule, so
//! every record gets exactly one rank.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{CacheRank, CacheUsage, ParsedCacheControl, RequestRecord};

const KNOWN_DIRECTIVES: [&str; 6] = ["public", "private", "no-cache", "no-store", "max-age", "s-maxage"];

/// Predicate of a rank rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RankCondition {
    /// Matches every record
    Always,
    /// Usage label is one of `usages`
    UsageIn { usages: Vec<CacheUsage> },
    /// Status code within `min..=max`
    StatusBetween { min: u16, max: u16 },
    /// Named `Cache-Control` directive is set
    Directive { name: String },
    AllOf { conditions: Vec<RankCondition> },
    AnyOf { conditions: Vec<RankCondition> },
}

/// Attributes a rank condition looks at
#[derive(Debug, Clone, Copy)]
pub struct RankSubject<'a> {
    pub usage: CacheUsage,
    pub cache_control: &'a ParsedCacheControl,
    pub status: u16,
}

impl<'a> From<&'a RequestRecord> for RankSubject<'a> {
    fn from(record: &'a RequestRecord) -> Self {
        Self {
            usage: record.cache_used(),
            cache_control: record.parsed_cache_control(),
            status: record.status,
        }
    }
}

impl RankCondition {
    pub fn usage(usages: &[CacheUsage]) -> Self {
        RankCondition::UsageIn {
            usages: usages.to_vec(),
        }
    }

    pub fn matches(&self, subject: &RankSubject<'_>) -> bool {
        match self {
            RankCondition::Always => true,
            RankCondition::UsageIn { usages } => usages.contains(&subject.usage),
            RankCondition::StatusBetween { min, max } => (*min..=*max).contains(&subject.status),
            RankCondition::Directive { name } => {
                let cc = subject.cache_control;
                match name.to_ascii_lowercase().as_str() {
                    "public" => cc.public,
                    "private" => cc.private,
                    "no-cache" => cc.no_cache,
                    "no-store" => cc.no_store,
                    "max-age" => cc.max_age.is_some(),
                    "s-maxage" => cc.s_max_age.is_some(),
                    _ => false,
                }
            }
            RankCondition::AllOf { conditions } => conditions.iter().all(|c| c.matches(subject)),
            RankCondition::AnyOf { conditions } => conditions.iter().any(|c| c.matches(subject)),
        }
    }

    fn unknown_directive(&self) -> Option<&str> {
        match self {
            RankCondition::Directive { name } => {
                let lower = name.to_ascii_lowercase();
                (!KNOWN_DIRECTIVES.contains(&lower.as_str())).then_some(name.as_str())
            }
            RankCondition::AllOf { conditions } | RankCondition::AnyOf { conditions } => {
                conditions.iter().find_map(RankCondition::unknown_directive)
            }
            _ => None,
        }
    }
}

/// One row of the rank table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRule {
    pub rank: String,
    pub color: String,
    pub when: RankCondition,
}

impl RankRule {
    pub fn new(rank: &str, color: &str, when: RankCondition) -> Self {
        Self {
            rank: rank.to_string(),
            color: color.to_string(),
            when,
        }
    }

    pub fn to_rank(&self) -> CacheRank {
        CacheRank {
            rank: self.rank.clone(),
            color: self.color.clone(),
        }
    }
}

/// Validated, ordered rank rules ending in a catch-all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RankRule>", into = "Vec<RankRule>")]
pub struct RankTable {
    rules: Vec<RankRule>,
    fallback: RankRule,
}

impl RankTable {
    /// Build a table, checking ordering and labels
    pub fn new(mut rules: Vec<RankRule>) -> Result<Self, ConfigError> {
        let fallback = rules.pop().ok_or(ConfigError::EmptyRankTable)?;
        if fallback.when != RankCondition::Always {
            return Err(ConfigError::MissingCatchAll(fallback.rank));
        }

        let mut seen = std::collections::HashSet::new();
        for rule in rules.iter().chain(std::iter::once(&fallback)) {
            if rule.rank.trim().is_empty() {
                return Err(ConfigError::EmptyRankLabel);
            }
            if !seen.insert(rule.rank.as_str()) {
                return Err(ConfigError::DuplicateRank(rule.rank.clone()));
            }
            if let Some(directive) = rule.when.unknown_directive() {
                return Err(ConfigError::UnknownDirective {
                    rank: rule.rank.clone(),
                    directive: directive.to_string(),
                });
            }
        }

        Ok(Self { rules, fallback })
    }

    /// Rules in evaluation order, catch-all last
    pub fn rules(&self) -> impl Iterator<Item = &RankRule> {
        self.rules.iter().chain(std::iter::once(&self.fallback))
    }

    /// The closed set of rank labels in table order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules().map(|rule| rule.rank.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Position of `label` in the table, best rank is 0
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels().position(|l| l == label)
    }

    /// First rule whose condition holds for `subject`
    pub fn rule_for(&self, subject: &RankSubject<'_>) -> &RankRule {
        self.rules
            .iter()
            .find(|rule| rule.when.matches(subject))
            .unwrap_or(&self.fallback)
    }

    /// Rank a record from its already derived attributes
    pub fn rank(&self, record: &RequestRecord) -> CacheRank {
        self.rule_for(&RankSubject::from(record)).to_rank()
    }
}

impl TryFrom<Vec<RankRule>> for RankTable {
    type Error = ConfigError;

    fn try_from(rules: Vec<RankRule>) -> Result<Self, Self::Error> {
        RankTable::new(rules)
    }
}

impl From<RankTable> for Vec<RankRule> {
    fn from(table: RankTable) -> Self {
        let mut rules = table.rules;
        rules.push(table.fallback);
        rules
    }
}

impl Default for RankTable {
    fn default() -> Self {
        use CacheUsage::*;
        Self {
            rules: vec![
                RankRule::new("Browser Cache", "#2e7d32", RankCondition::usage(&[BrowserCache, ServiceWorker])),
                RankRule::new("Edge Hit", "#43a047", RankCondition::usage(&[EdgeHit])),
                RankRule::new("Revalidated", "#c0ca33", RankCondition::usage(&[EdgeRefresh, Revalidated])),
                RankRule::new("Edge Miss", "#fb8c00", RankCondition::usage(&[EdgeMiss])),
                RankRule::new("Origin", "#f4511e", RankCondition::usage(&[Origin])),
                RankRule::new("Not Cacheable", "#e53935", RankCondition::usage(&[NotCacheable])),
            ],
            fallback: RankRule::new("Unknown", "#9e9e9e", RankCondition::Always),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(usage: CacheUsage, cc: &ParsedCacheControl, status: u16) -> RankSubject<'_> {
        RankSubject {
            usage,
            cache_control: cc,
            status,
        }
    }

    #[test]
    fn every_usage_gets_exactly_one_rank() {
        let table = RankTable::default();
        let cc = ParsedCacheControl::default();
        for usage in CacheUsage::ALL {
            let rule = table.rule_for(&subject(usage, &cc, 200));
            assert!(table.position(&rule.rank).is_some());
        }
        assert_eq!(table.rule_for(&subject(CacheUsage::Unknown, &cc, 0)).rank, "Unknown");
        assert_eq!(table.rule_for(&subject(CacheUsage::EdgeRefresh, &cc, 200)).rank, "Revalidated");
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = RankTable::new(vec![
            RankRule::new("Immutable", "#000", RankCondition::Directive { name: "max-age".into() }),
            RankRule::new("Hit", "#111", RankCondition::usage(&[CacheUsage::EdgeHit])),
            RankRule::new("Rest", "#222", RankCondition::Always),
        ])
        .unwrap();
        let cc = ParsedCacheControl {
            max_age: Some(60),
            ..Default::default()
        };
        assert_eq!(table.rule_for(&subject(CacheUsage::EdgeHit, &cc, 200)).rank, "Immutable");
        let bare = ParsedCacheControl::default();
        assert_eq!(table.rule_for(&subject(CacheUsage::EdgeHit, &bare, 200)).rank, "Hit");
        assert_eq!(table.rule_for(&subject(CacheUsage::Origin, &bare, 200)).rank, "Rest");
    }

    #[test]
    fn composite_conditions() {
        let cond = RankCondition::AllOf {
            conditions: vec![
                RankCondition::StatusBetween { min: 200, max: 299 },
                RankCondition::AnyOf {
                    conditions: vec![
                        RankCondition::Directive { name: "public".into() },
                        RankCondition::Directive { name: "S-MAXAGE".into() },
                    ],
                },
            ],
        };
        let public = ParsedCacheControl {
            public: true,
            ..Default::default()
        };
        assert!(cond.matches(&subject(CacheUsage::Origin, &public, 200)));
        assert!(!cond.matches(&subject(CacheUsage::Origin, &public, 404)));
        assert!(!cond.matches(&subject(CacheUsage::Origin, &ParsedCacheControl::default(), 200)));
    }

    #[test]
    fn table_requires_terminal_catch_all() {
        let err = RankTable::new(vec![RankRule::new("Hit", "#111", RankCondition::usage(&[CacheUsage::EdgeHit]))])
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCatchAll(_)));
        assert!(matches!(RankTable::new(Vec::new()), Err(ConfigError::EmptyRankTable)));
    }

    #[test]
    fn table_rejects_duplicates_and_unknown_directives() {
        let dup = RankTable::new(vec![
            RankRule::new("A", "#111", RankCondition::usage(&[CacheUsage::EdgeHit])),
            RankRule::new("A", "#222", RankCondition::Always),
        ]);
        assert!(matches!(dup, Err(ConfigError::DuplicateRank(label)) if label == "A"));

        let bad = RankTable::new(vec![
            RankRule::new("A", "#111", RankCondition::Directive { name: "immutable".into() }),
            RankRule::new("B", "#222", RankCondition::Always),
        ]);
        assert!(matches!(bad, Err(ConfigError::UnknownDirective { .. })));
    }

    #[test]
    fn table_serializes_as_rule_list() {
        let table = RankTable::default();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(7));
        assert_eq!(json[0]["when"]["type"], "usage_in");
        let back: RankTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.labels().last(), Some("Unknown"));
    }
}
