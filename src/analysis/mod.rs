//! Cache analysis engine
//!
//! Pure functions over in-memory records: header parsing and usage classification run once
//! per record at ingestion, while filtering, ranking lookups and aggregation read the derived
//! fields without re-parsing anything.

mod breakdown;
mod cache_control;
mod filter;
mod rank;
mod timeseries;
mod usage;

pub use breakdown::{breakdown, domain_rank_matrix, facets, file_type, DomainRanks, Facets, GroupKey};
pub use cache_control::parse_cache_control;
pub use filter::{apply_filter, wildcard_to_regex, CompiledFilter, RecordFilterExt};
pub use rank::{RankCondition, RankRule, RankSubject, RankTable};
pub use timeseries::{aggregate, minute_start, TimeBucket, ValueMode};
pub use usage::{UsagePattern, UsageRules};
