//! # Cache Analyzer Core
//!
//! Cache classification and filtering engine for recorded HTTP traffic.
//! Answers "how effectively is this traffic being cached?" for browser network captures.
//!
//! ## Features
//!
//! - `Cache-Control` parsing into structured directives
//! - Cache usage classification from fulfilled-by, CDN and directive signals
//! - Configurable, ordered cache rank table
//! - Multi-field filtering with wildcard URL patterns
//! - Per-minute time series, grouped breakdowns and filter facets
//! - Import of HAR captures and record exports, JSON export
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 HAR / record JSON / bundles                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │   ingest: parse Cache-Control → classify usage → rank         │
//! │           (once per record)                                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │                  Vec<RequestRecord>                           │
//! │  ┌──────────┐   ┌───────────────┐   ┌─────────────────────┐   │
//! │  │  Filter  │──▶│  Time series  │   │ Breakdowns / facets │   │
//! │  └──────────┘   └───────────────┘   └─────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;

pub use config::EngineConfig;
pub use error::{ConfigError, ImportError};
pub use ingest::{DataSource, Ingestor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
