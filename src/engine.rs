//! End-to-end coverage pipeline
//!
//! One handle over the annotation catalog and the sample registry that
//! extracts, joins, projects and aggregates depth on demand. Depth
//! matrices and summary tables are cached per request key; projections are
//! cheap and rebuilt every call.

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, ResultCache};
use crate::coverage::{extract_coverage, CoverageTable, SyntheticDepthSource};
use crate::error::{CoverageError, Result};
use crate::io::bam::BamDepthSource;
use crate::join::{join_tables, CoverageMatrix};
use crate::projection::{ProjectedRow, ProjectedTranscript, Projection};
use crate::samples::{Backing, SampleRegistry};
use crate::summary::{summarize, AggregateFn, SummaryTable};
use crate::types::{Transcript, TranscriptCatalog};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for request padding. Extraction always runs at this
    /// width, so one cached matrix serves every narrower display of the
    /// same transcript and samples.
    pub max_padding: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_padding: 100 }
    }
}

/// Display-ready coverage for one transcript: the compacted axis, the
/// projected annotation landmarks and one row per on-axis position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCoverage {
    /// Column header, aligned with every row's depth vector.
    pub samples: Vec<String>,
    pub transcript: ProjectedTranscript,
    /// Display coordinates where the genomic axis is discontinuous.
    pub jumps: Vec<u32>,
    /// Length of the display axis.
    pub axis_len: u32,
    pub rows: Vec<ProjectedRow>,
}

/// Coverage pipeline over a transcript catalog and a sample registry.
pub struct CoverageEngine {
    catalog: Arc<TranscriptCatalog>,
    registry: SampleRegistry,
    config: EngineConfig,
    matrices: ResultCache<CoverageMatrix>,
    summaries: ResultCache<SummaryTable>,
}

impl CoverageEngine {
    pub fn new(catalog: TranscriptCatalog, registry: SampleRegistry) -> Self {
        Self::with_config(catalog, registry, EngineConfig::default())
    }

    pub fn with_config(
        catalog: TranscriptCatalog,
        registry: SampleRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            registry,
            config,
            matrices: ResultCache::new(),
            summaries: ResultCache::new(),
        }
    }

    pub fn catalog(&self) -> &TranscriptCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drop every cached matrix and summary.
    pub fn clear_cache(&self) {
        self.matrices.clear();
        self.summaries.clear();
    }

    /// Annotated transcripts of `gene`, ascending by insertion order.
    pub fn gene_transcripts(&self, gene: &str) -> Result<&[Arc<Transcript>]> {
        self.catalog
            .gene(gene)
            .ok_or_else(|| CoverageError::UnknownGene(gene.to_string()))
    }

    fn transcript(&self, accession: &str) -> Result<&Arc<Transcript>> {
        self.catalog
            .transcript(accession)
            .ok_or_else(|| CoverageError::UnknownTranscript(accession.to_string()))
    }

    /// Per-base depth matrix for `accession` over `samples`, extracted at
    /// the configured maximum padding and cached.
    ///
    /// Columns follow the canonical cache order (sorted sample ids), so
    /// permutations of the same sample set share one cache entry and one
    /// result.
    pub fn coverage_matrix(
        &self,
        accession: &str,
        samples: &[String],
    ) -> Result<Arc<CoverageMatrix>> {
        if samples.is_empty() {
            return Err(CoverageError::InvariantViolation(
                "at least one sample is required".to_string(),
            ));
        }
        let transcript = Arc::clone(self.transcript(accession)?);
        let key = CacheKey::new(accession, self.config.max_padding, samples, None);
        let ordered: Vec<String> = key.samples().to_vec();
        self.matrices.memoize(key, || {
            let tables: Vec<CoverageTable> = ordered
                .par_iter()
                .map(|id| self.extract_one(id, &transcript))
                .collect::<Result<_>>()?;
            debug!(
                "joining {} coverage tables for {}",
                tables.len(),
                transcript.accession
            );
            join_tables(&tables)
        })
    }

    /// Per-exon and per-transcript depth aggregates for `accession` over
    /// `samples`, cached per aggregate function.
    ///
    /// Aggregation sees only on-target rows (padding stripped), and the
    /// transcript row is always computed from the original per-base depths
    /// rather than from the exon aggregates.
    pub fn summary_table(
        &self,
        accession: &str,
        samples: &[String],
        agg: AggregateFn,
    ) -> Result<Arc<SummaryTable>> {
        let transcript = Arc::clone(self.transcript(accession)?);
        let key = CacheKey::new(accession, self.config.max_padding, samples, Some(agg));
        self.summaries.memoize(key, || {
            let matrix = self.coverage_matrix(accession, samples)?;
            let mut on_target = (*matrix).clone();
            on_target.retain_on_target(&transcript);
            Ok(summarize(&on_target, agg))
        })
    }

    /// Coverage for `accession` over `samples`, projected onto the compact
    /// display axis at `padding` (clamped to the configured maximum).
    ///
    /// The underlying matrix is extracted once at maximum padding; a
    /// narrower request simply projects fewer of its rows.
    pub fn projected_coverage(
        &self,
        accession: &str,
        samples: &[String],
        padding: u32,
    ) -> Result<ProjectedCoverage> {
        let padding = padding.min(self.config.max_padding);
        let transcript = Arc::clone(self.transcript(accession)?);
        let matrix = self.coverage_matrix(accession, samples)?;

        let projection = Projection::for_transcript(&transcript, padding);
        let landmarks = projection.project_transcript(&transcript)?;
        let rows = projection.project_matrix(&matrix);
        Ok(ProjectedCoverage {
            samples: matrix.samples.clone(),
            transcript: landmarks,
            jumps: projection.jump_positions().to_vec(),
            axis_len: projection.len(),
            rows,
        })
    }

    fn extract_one(&self, id: &str, transcript: &Transcript) -> Result<CoverageTable> {
        let record = self.registry.get(id)?;
        let padding = self.config.max_padding;
        match &record.backing {
            Backing::Synthetic => {
                let mut source = SyntheticDepthSource::for_transcript(transcript, padding);
                extract_coverage(&mut source, &record.name, transcript, padding)
            }
            Backing::Bam(path) => {
                let mut source = BamDepthSource::open(path)?;
                extract_coverage(&mut source, &record.name, transcript, padding)
            }
            Backing::Unsupported { reason, .. } => Err(CoverageError::UnsupportedSample {
                id: id.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
