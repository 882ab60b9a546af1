//! Per-exon and per-transcript summary statistics

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::join::CoverageMatrix;

/// Aggregation applied to groups of per-position depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Min,
    Max,
    Median,
    Mean,
}

impl AggregateFn {
    /// Every supported aggregation, in menu order.
    pub const ALL: [AggregateFn; 4] = [
        AggregateFn::Min,
        AggregateFn::Max,
        AggregateFn::Median,
        AggregateFn::Mean,
    ];

    /// Parse the lowercase name used in configuration and request payloads.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(AggregateFn::Min),
            "max" => Some(AggregateFn::Max),
            "median" => Some(AggregateFn::Median),
            "mean" => Some(AggregateFn::Mean),
            _ => None,
        }
    }

    /// Reduce a group of depths. An empty group reduces to 0.
    pub fn apply(&self, depths: &[u32]) -> f64 {
        match self {
            AggregateFn::Min => depths.iter().copied().min().map_or(0.0, f64::from),
            AggregateFn::Max => depths.iter().copied().max().map_or(0.0, f64::from),
            AggregateFn::Median => median(depths),
            AggregateFn::Mean => {
                if depths.is_empty() {
                    0.0
                } else {
                    let sum: u64 = depths.iter().map(|&d| u64::from(d)).sum();
                    sum as f64 / depths.len() as f64
                }
            }
        }
    }

    /// Round to one decimal, half away from zero (`f64::round` semantics):
    /// `14.85` becomes `14.9` and `-0.05` becomes `-0.1`.
    pub fn round1(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }
}

/// Error returned when parsing an unknown aggregation name.
#[derive(Debug, Error)]
#[error("unknown aggregation: {0:?}")]
pub struct ParseAggregateError(String);

impl FromStr for AggregateFn {
    type Err = ParseAggregateError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name).ok_or_else(|| ParseAggregateError(name.to_string()))
    }
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
            AggregateFn::Median => "median",
            AggregateFn::Mean => "mean",
        };
        write!(f, "{}", name)
    }
}

fn median(depths: &[u32]) -> f64 {
    if depths.is_empty() {
        return 0.0;
    }
    let mut sorted = depths.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
    } else {
        f64::from(sorted[mid])
    }
}

/// Discriminates the transcript-wide row from per-exon rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Transcript,
    Exon,
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub kind: RowKind,
    /// 1-based exon number; `None` on the transcript row.
    pub exon_no: Option<u32>,
    /// Aggregated depth per sample, aligned with the table header and
    /// rounded to one decimal.
    pub values: Vec<f64>,
}

/// Summary statistics for one transcript across samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Column header: sample display names.
    pub samples: Vec<String>,
    /// Aggregation the values were reduced with.
    pub agg: AggregateFn,
    /// Transcript row first, then exon rows ascending by exon number.
    pub rows: Vec<SummaryRow>,
}

/// Summarize a position matrix into one transcript row plus one row per
/// exon.
///
/// Per-exon values reduce the `(exon_no, sample)` groups. The transcript
/// row reduces the original per-position observations grouped by sample
/// only; it is not an aggregate of the per-exon results, which differs for
/// every statistic except min and max once exon sizes are uneven.
pub fn summarize(matrix: &CoverageMatrix, agg: AggregateFn) -> SummaryTable {
    let n_samples = matrix.samples.len();
    let mut per_exon: BTreeMap<u32, Vec<Vec<u32>>> = BTreeMap::new();
    let mut per_sample: Vec<Vec<u32>> = vec![Vec::new(); n_samples];

    for row in &matrix.rows {
        let groups = per_exon
            .entry(row.exon_no)
            .or_insert_with(|| vec![Vec::new(); n_samples]);
        for (s, &depth) in row.depths.iter().enumerate() {
            groups[s].push(depth);
            per_sample[s].push(depth);
        }
    }

    let mut rows = Vec::with_capacity(per_exon.len() + 1);
    rows.push(SummaryRow {
        kind: RowKind::Transcript,
        exon_no: None,
        values: per_sample
            .iter()
            .map(|group| AggregateFn::round1(agg.apply(group)))
            .collect(),
    });
    for (&exon_no, groups) in &per_exon {
        rows.push(SummaryRow {
            kind: RowKind::Exon,
            exon_no: Some(exon_no),
            values: groups
                .iter()
                .map(|group| AggregateFn::round1(agg.apply(group)))
                .collect(),
        });
    }

    SummaryTable {
        samples: matrix.samples.clone(),
        agg,
        rows,
    }
}
