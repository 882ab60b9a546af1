//! File format I/O modules
//!
//! Readers for the two on-disk inputs the engine consumes: refGene-style
//! transcript annotations and indexed BAM alignment files.

pub mod bam;
pub mod refgene;

pub use bam::{read_read_groups, BamDepthSource, ReadGroup};
pub use refgene::{load_catalog, RefGeneError, RefGeneReader};
