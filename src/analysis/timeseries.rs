//! Per-minute time series
//!
//! Records are grouped by the local calendar minute that contains their timestamp. Each bucket
//! carries a value for every rank of the table, in table order, so chart series line up.
//! Minutes without records are not synthesized.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::RankTable;
use crate::models::RequestRecord;

/// What a bucket accumulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// One per request
    Count,
    /// Response size in kilobytes
    Size,
}

impl ValueMode {
    pub fn value_of(&self, record: &RequestRecord) -> f64 {
        match self {
            ValueMode::Count => 1.0,
            ValueMode::Size => record.size_kb(),
        }
    }
}

impl FromStr for ValueMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" | "requests" => Ok(ValueMode::Count),
            "size" | "bytes" | "kb" => Ok(ValueMode::Size),
            other => Err(format!("unknown value mode `{other}`, expected count or size")),
        }
    }
}

/// One minute of traffic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBucket {
    /// Local wall-clock label, `HH:MM`
    pub bucket_label: String,
    /// Epoch milliseconds of the start of the minute
    pub minute_start_ms: i64,
    pub per_rank: IndexMap<String, f64>,
}

/// Start of the local minute containing `timestamp_ms`, in epoch milliseconds.
pub fn minute_start(timestamp_ms: i64) -> i64 {
    let truncated = Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .and_then(|dt| dt.with_second(0))
        .and_then(|dt| dt.with_nanosecond(0));
    match truncated {
        Some(dt) => dt.timestamp_millis(),
        None => timestamp_ms - timestamp_ms.rem_euclid(60_000),
    }
}

fn minute_label(minute_start_ms: i64) -> String {
    match Local.timestamp_millis_opt(minute_start_ms).single() {
        Some(dt) => format_label(&dt),
        None => String::from("--:--"),
    }
}

fn format_label(dt: &DateTime<Local>) -> String {
    dt.format("%H:%M").to_string()
}

/// Bucket records per local minute, ascending by minute.
pub fn aggregate<'r, I>(records: I, ranks: &RankTable, mode: ValueMode) -> Vec<TimeBucket>
where
    I: IntoIterator<Item = &'r RequestRecord>,
{
    let mut minutes: BTreeMap<i64, IndexMap<String, f64>> = BTreeMap::new();

    for record in records {
        let per_rank = minutes
            .entry(minute_start(record.timestamp_ms))
            .or_insert_with(|| ranks.labels().map(|label| (label.to_string(), 0.0)).collect());
        *per_rank
            .entry(record.cache_rank().rank.clone())
            .or_insert(0.0) += mode.value_of(record);
    }

    minutes
        .into_iter()
        .map(|(minute_start_ms, per_rank)| TimeBucket {
            bucket_label: minute_label(minute_start_ms),
            minute_start_ms,
            per_rank,
        })
        .collect()
}
