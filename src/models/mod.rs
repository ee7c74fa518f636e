//! Data models for the cache analyzer
//!
//! These models are shared between the engine, the importers and the CLI.

pub mod filter;
pub mod record;
pub mod usage;

pub use filter::*;
pub use record::*;
pub use usage::*;
