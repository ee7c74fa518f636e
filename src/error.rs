//! Error types for the boundaries of the engine.
//!
//! The classification pipeline itself is total; only configuration loading and file import
//! can fail.

use std::path::PathBuf;

/// Invalid engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("rank table is empty")]
    EmptyRankTable,

    #[error("last rank rule `{0}` must use the `always` condition")]
    MissingCatchAll(String),

    #[error("rank label must not be empty")]
    EmptyRankLabel,

    #[error("duplicate rank label `{0}`")]
    DuplicateRank(String),

    #[error("rank `{rank}` references unknown directive `{directive}`")]
    UnknownDirective { rank: String, directive: String },

    #[error("usage pattern for {0} must not be empty")]
    EmptyPattern(String),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to import a whole file. Problems with single entries are logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized data format: expected a HAR log, a record array or a bundle object")]
    UnrecognizedFormat,

    #[error("input contains no usable entries")]
    NoEntries,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_the_rank() {
        let err = ConfigError::DuplicateRank("Edge Hit".to_string());
        assert!(err.to_string().contains("Edge Hit"));
    }

    #[test]
    fn json_errors_convert() {
        let err: ImportError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().starts_with("invalid JSON"));
    }
}
