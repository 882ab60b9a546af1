// exoncov
// Per-base depth of coverage over transcript models

#![warn(missing_docs)]

//! exoncov
//!
//! This crate extracts per-base read depth over the exons of annotated
//! transcripts, joins samples into comparable matrices, projects the
//! sparse genomic positions onto a compact display axis and aggregates
//! depth per exon and per transcript.

/// Core data types: strands, exons, transcripts and the catalog
pub mod types;

/// Exon interval arithmetic and padded extraction windows
pub mod intervals;

/// Per-sample depth extraction and depth sources
pub mod coverage;

/// Joining per-sample coverage tables into wide matrices
pub mod join;

/// Projection onto the compact display axis
pub mod projection;

/// Per-exon and per-transcript depth aggregation
pub mod summary;

/// Concurrent caching of computed results
pub mod cache;

/// Sample registry and discovery
pub mod samples;

/// The end-to-end coverage engine
pub mod engine;

/// Crate-wide error types
pub mod error;

/// Annotation and alignment file I/O
pub mod io;

// Re-export commonly used types
pub use types::*;
pub use cache::{CacheKey, ResultCache};
pub use coverage::{
    extract_coverage, CoverageRow, CoverageTable, DepthSource, SyntheticDepthSource,
    SYNTHETIC_MAX_DEPTH,
};
pub use engine::{CoverageEngine, EngineConfig, ProjectedCoverage};
pub use error::{CoverageError, Result};
pub use intervals::{ExonIntervals, PaddedWindow};
pub use join::{join_tables, CoverageMatrix, MatrixRow};
pub use projection::{ProjectedRow, ProjectedTranscript, Projection};
pub use samples::{Backing, SampleRecord, SampleRegistry, SYNTHETIC_SAMPLE_ID};
pub use summary::{summarize, AggregateFn, ParseAggregateError, RowKind, SummaryRow, SummaryTable};

/// Version information for the exoncov library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
