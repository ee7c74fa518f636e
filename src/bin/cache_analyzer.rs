//! Command line front end for the cache analyzer.
//!
//! Every subcommand prints JSON to stdout; logs go to stderr.
//!
//! Usage:
//! ```text
//! cargo run --bin cache-analyzer -- summary capture.har --where '{"method":["GET"]}'
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use cache_analyzer_core::analysis::{
    aggregate, apply_filter, breakdown, domain_rank_matrix, facets, GroupKey, ValueMode,
};
use cache_analyzer_core::ingest::export_bundle_to_path;
use cache_analyzer_core::logging::{init_tracing, resolve_log_level};
use cache_analyzer_core::models::{FilterCriteria, RequestRecord};
use cache_analyzer_core::{DataSource, EngineConfig, Ingestor};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

/// Analyze how effectively recorded HTTP traffic is cached
#[derive(Parser, Debug)]
#[command(name = "cache-analyzer", version)]
struct Cli {
    /// Engine configuration (usage rules and rank table) as JSON
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Write logs to a daily rolling file in this directory instead of stderr
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request and size totals per cache rank
    Summary(QueryArgs),

    /// Print the records that match the filter
    Filter(QueryArgs),

    /// Per-minute series by cache rank
    Timeseries {
        #[command(flatten)]
        query: QueryArgs,

        /// count or size (KB)
        #[arg(long, default_value = "count")]
        value: ValueMode,
    },

    /// Totals grouped by one attribute
    Breakdown {
        #[command(flatten)]
        query: QueryArgs,

        /// x-cache, pop, file-type, domain, cache-rank or cache-used
        #[arg(long)]
        by: GroupKey,

        /// count or size (KB)
        #[arg(long, default_value = "count")]
        value: ValueMode,
    },

    /// Top domains split by cache rank
    Domains {
        #[command(flatten)]
        query: QueryArgs,

        #[arg(long, default_value_t = 10)]
        top: usize,

        /// count or size (KB)
        #[arg(long, default_value = "size")]
        value: ValueMode,
    },

    /// Distinct filter values present in the data
    Facets(QueryArgs),

    /// Bundle every source of the inputs into one JSON file
    Export {
        /// HAR captures, record exports, bundles or directories
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// HAR capture, record export, bundle or directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Source to analyze when the input holds several (default: the last one)
    #[arg(long)]
    source: Option<String>,

    /// Filter criteria as a JSON file
    #[arg(long, value_name = "FILE")]
    filter: Option<PathBuf>,

    /// Filter criteria as inline JSON, applied over --filter
    #[arg(long = "where", value_name = "JSON")]
    where_json: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    source: String,
    total_requests: usize,
    matched_requests: usize,
    matched_kb: f64,
    requests_by_rank: Vec<(String, f64)>,
    kb_by_rank: Vec<(String, f64)>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else if cli.quiet {
        LevelFilter::ERROR
    } else {
        resolve_log_level()
    };
    let _guard = init_tracing(level, cli.log_dir.as_deref())?;

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let ingestor = Ingestor::new(Arc::new(config));

    match cli.command {
        Command::Summary(query) => {
            let source = load_source(&ingestor, &query)?;
            let criteria = load_criteria(&query)?;
            let matched = apply_filter(&source.records, &criteria);
            print_json(&Summary {
                total_requests: source.records.len(),
                matched_requests: matched.len(),
                matched_kb: matched.iter().map(|r| r.size_kb()).sum(),
                requests_by_rank: breakdown(matched.iter().copied(), GroupKey::CacheRank, ValueMode::Count),
                kb_by_rank: breakdown(matched.iter().copied(), GroupKey::CacheRank, ValueMode::Size),
                source: source.name,
            })
        }
        Command::Filter(query) => {
            let source = load_source(&ingestor, &query)?;
            let criteria = load_criteria(&query)?;
            let matched: Vec<&RequestRecord> = apply_filter(&source.records, &criteria);
            print_json(&matched)
        }
        Command::Timeseries { query, value } => {
            let source = load_source(&ingestor, &query)?;
            let criteria = load_criteria(&query)?;
            let matched = apply_filter(&source.records, &criteria);
            print_json(&aggregate(matched, &ingestor.config().ranks, value))
        }
        Command::Breakdown { query, by, value } => {
            let source = load_source(&ingestor, &query)?;
            let criteria = load_criteria(&query)?;
            let matched = apply_filter(&source.records, &criteria);
            print_json(&breakdown(matched, by, value))
        }
        Command::Domains { query, top, value } => {
            let source = load_source(&ingestor, &query)?;
            let criteria = load_criteria(&query)?;
            let matched = apply_filter(&source.records, &criteria);
            print_json(&domain_rank_matrix(matched, &ingestor.config().ranks, top, value))
        }
        Command::Facets(query) => {
            let source = load_source(&ingestor, &query)?;
            print_json(&facets(&source.records))
        }
        Command::Export { inputs, out } => {
            let mut sources = Vec::new();
            for input in &inputs {
                sources.extend(load_sources(&ingestor, input)?);
            }
            let written = export_bundle_to_path(&sources, &out)?;
            tracing::info!(
                "exported {} records from {} sources to {}",
                written,
                sources.len(),
                out.display()
            );
            Ok(())
        }
    }
}

fn load_sources(ingestor: &Ingestor, input: &Path) -> anyhow::Result<Vec<DataSource>> {
    ingestor
        .ingest_path(input)
        .with_context(|| format!("importing {}", input.display()))
}

fn load_source(ingestor: &Ingestor, query: &QueryArgs) -> anyhow::Result<DataSource> {
    let sources = load_sources(ingestor, &query.input)?;
    match &query.source {
        Some(name) => sources
            .into_iter()
            .find(|s| &s.name == name)
            .ok_or_else(|| anyhow!("source `{}` not found in {}", name, query.input.display())),
        None => sources
            .into_iter()
            .last()
            .ok_or_else(|| anyhow!("no sources in {}", query.input.display())),
    }
}

fn load_criteria(query: &QueryArgs) -> anyhow::Result<FilterCriteria> {
    let base = match &query.filter {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading filter {}", path.display()))?;
            serde_json::from_str(&contents).context("parsing filter file")?
        }
        None => FilterCriteria::default(),
    };
    match &query.where_json {
        Some(json) => {
            let inline: FilterCriteria = serde_json::from_str(json).context("parsing --where")?;
            Ok(base.merged(&inline))
        }
        None => Ok(base),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
