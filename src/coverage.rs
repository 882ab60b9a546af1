//! Per-base coverage extraction over padded exon windows

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::intervals::ExonIntervals;
use crate::types::{Position, Transcript};

/// Highest depth emitted by the synthetic ramp; real samples are unbounded.
pub const SYNTHETIC_MAX_DEPTH: u32 = 50;

/// One observed position of a sample's coverage track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    /// Genomic position, 1-based.
    pub pos: u64,
    /// 1-based exon number in transcript orientation.
    pub exon_no: u32,
    /// Read depth at the position.
    pub depth: u32,
}

/// Dense per-position coverage of one sample over one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageTable {
    /// Display name of the sample.
    pub sample: String,
    /// Chromosome the rows live on.
    pub chrom: String,
    pub rows: Vec<CoverageRow>,
}

/// Supplies read depth over half-open genomic ranges.
///
/// Implementations report only positions with nonzero depth, ascending; the
/// extractor fills the gaps with zeros.
pub trait DepthSource {
    /// Depth per 0-based position over `[begin, end)` on `chrom`.
    fn pileup(&mut self, chrom: &str, begin: Position, end: Position)
        -> Result<Vec<(Position, u32)>>;
}

/// Deterministic depth ramp standing in for a real alignment file.
///
/// The i-th position of the transcript's padded position set gets depth
/// `floor(50 * i / n)`, so identical inputs always reproduce the same track
/// and the full track sweeps depths from 0 toward the maximum.
#[derive(Debug, Clone)]
pub struct SyntheticDepthSource {
    depths: BTreeMap<Position, u32>,
}

impl SyntheticDepthSource {
    /// Ramp over the padded, merged position set of `transcript`.
    pub fn for_transcript(transcript: &Transcript, padding: u32) -> Self {
        let intervals = ExonIntervals::new(&transcript.exons);
        Self::from_positions(&intervals.positions(padding))
    }

    /// Ramp over an explicit, strictly ascending position set.
    pub fn from_positions(positions: &[Position]) -> Self {
        let n = positions.len() as u64;
        let depths = positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                let depth = if n == 0 {
                    0
                } else {
                    (u64::from(SYNTHETIC_MAX_DEPTH) * i as u64 / n) as u32
                };
                (pos, depth)
            })
            .collect();
        Self { depths }
    }
}

impl DepthSource for SyntheticDepthSource {
    fn pileup(
        &mut self,
        _chrom: &str,
        begin: Position,
        end: Position,
    ) -> Result<Vec<(Position, u32)>> {
        Ok(self
            .depths
            .range(begin..end)
            .filter(|(_, &depth)| depth > 0)
            .map(|(&pos, &depth)| (pos, depth))
            .collect())
    }
}

/// Extract dense per-position coverage for one sample.
///
/// Walks every padded exon window in genomic order and emits exactly one row
/// per window position, zero-filled where the source reports nothing. Rows
/// carry 1-based positions and the strand-aware exon number. Windows of
/// neighboring exons may overlap under padding; the overlap positions are
/// emitted once per window, and the final table is stably sorted by
/// position so duplicates sit next to each other in window order.
pub fn extract_coverage<S: DepthSource>(
    source: &mut S,
    sample: &str,
    transcript: &Transcript,
    padding: u32,
) -> Result<CoverageTable> {
    let intervals = ExonIntervals::new(&transcript.exons);
    let mut rows = Vec::new();
    for window in intervals.windows(padding) {
        let exon_no = transcript.exon_number(window.exon_index);
        let depths: BTreeMap<Position, u32> = source
            .pileup(&transcript.chrom, window.begin, window.end)?
            .into_iter()
            .collect();
        for pos in window.begin..window.end {
            rows.push(CoverageRow {
                pos: pos + 1,
                exon_no,
                depth: depths.get(&pos).copied().unwrap_or(0),
            });
        }
    }
    rows.sort_by_key(|row| row.pos);
    debug!(
        "extracted {} rows for sample {} over {} ({} exons, padding {})",
        rows.len(),
        sample,
        transcript.accession,
        transcript.exon_count(),
        padding
    );
    Ok(CoverageTable {
        sample: sample.to_string(),
        chrom: transcript.chrom.clone(),
        rows,
    })
}
