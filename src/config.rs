//! Engine configuration
//!
//! The usage rules and the rank table are plain data handed to the ingestor, the filter and
//! the aggregator. Nothing in the engine reads configuration from global state.
//!
//! A JSON file may override either section; a missing section keeps the built-in default:
//!
//! ```json
//! {
//!   "usage": { "x_cache": [{ "contains": "tcp_hit", "usage": "edge-hit" }] },
//!   "ranks": [
//!     { "rank": "Hit", "color": "#43a047", "when": { "type": "usage_in", "usages": ["edge-hit"] } },
//!     { "rank": "Other", "color": "#9e9e9e", "when": { "type": "always" } }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::{RankTable, UsageRules, UsagePattern};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub usage: UsageRules,
    pub ranks: RankTable,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&contents)?;
        tracing::debug!(
            "loaded engine config from {} ({} rank rules)",
            path.display(),
            config.ranks.len()
        );
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    ///
    /// Rank table ordering is already enforced when the table is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_patterns("fulfilled_by", &self.usage.fulfilled_by)?;
        check_patterns("x_cache", &self.usage.x_cache)?;
        Ok(())
    }
}

fn check_patterns(field: &str, patterns: &[UsagePattern]) -> Result<(), ConfigError> {
    if patterns.iter().any(|p| p.contains.trim().is_empty()) {
        return Err(ConfigError::EmptyPattern(field.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CacheUsage;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn sections_override_independently() {
        let config = EngineConfig::from_json(
            r##"{
                "ranks": [
                    { "rank": "Hit", "color": "#0f0", "when": { "type": "usage_in", "usages": ["edge-hit"] } },
                    { "rank": "Other", "color": "#999", "when": { "type": "always" } }
                ]
            }"##,
        )
        .unwrap();
        assert_eq!(config.usage, UsageRules::default());
        assert_eq!(config.ranks.labels().collect::<Vec<_>>(), vec!["Hit", "Other"]);
    }

    #[test]
    fn invalid_rank_table_is_rejected() {
        let err = EngineConfig::from_json(
            r##"{ "ranks": [ { "rank": "Hit", "color": "#0f0", "when": { "type": "usage_in", "usages": ["edge-hit"] } } ] }"##,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("always"));
    }

    #[test]
    fn blank_usage_pattern_is_rejected() {
        let mut config = EngineConfig::default();
        config.usage.x_cache.push(UsagePattern::new(" ", CacheUsage::EdgeHit));
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPattern(field)) if field == "x_cache"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
