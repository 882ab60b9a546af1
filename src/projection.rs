//! Projection of sparse genomic positions onto a compact display axis
//!
//! A transcript's padded position set skips introns beyond the padding.
//! Plotting raw genomic coordinates would spread a handful of exons across
//! megabases, so positions are ranked: the i-th smallest position of the
//! set maps to display coordinate i. The seams where the set is not
//! contiguous are recorded so a renderer can mark them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoverageError, Result};
use crate::intervals::ExonIntervals;
use crate::join::CoverageMatrix;
use crate::types::{Position, Transcript};

/// Transcript landmarks in display coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedTranscript {
    pub tx_begin: u32,
    /// End-exclusive, like the genomic coordinate it comes from.
    pub tx_end: u32,
    /// CDS bounds; `None` for non-coding transcripts.
    pub cds: Option<(u32, u32)>,
    /// Projected `(begin, end)` per exon, ascending genomic order.
    pub exons: Vec<(u32, u32)>,
}

/// One matrix row placed on the display axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedRow {
    /// Display coordinate.
    pub x: u32,
    /// 1-based exon number carried from the source row.
    pub exon_no: u32,
    /// Depth per sample, aligned with the source matrix header.
    pub depths: Vec<u32>,
}

/// Rank map over a transcript's padded position set.
#[derive(Debug, Clone)]
pub struct Projection {
    index: HashMap<Position, u32>,
    jumps: Vec<u32>,
    len: u32,
}

impl Projection {
    /// Projection over the padded, merged position set of `transcript`.
    pub fn for_transcript(transcript: &Transcript, padding: u32) -> Self {
        let intervals = ExonIntervals::new(&transcript.exons);
        Self::from_positions(&intervals.positions(padding))
    }

    /// Projection over an explicit, strictly ascending position set.
    pub fn from_positions(positions: &[Position]) -> Self {
        let mut index = HashMap::with_capacity(positions.len());
        let mut jumps = Vec::new();
        for (i, &pos) in positions.iter().enumerate() {
            index.insert(pos, i as u32);
            if i > 0 && pos != positions[i - 1] + 1 {
                jumps.push(i as u32);
            }
        }
        Self {
            index,
            jumps,
            len: positions.len() as u32,
        }
    }

    /// Length of the display axis.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Display coordinate of a genomic position; `None` outside the set.
    pub fn project(&self, pos: Position) -> Option<u32> {
        self.index.get(&pos).copied()
    }

    /// Project an end-exclusive coordinate, keeping half-open intervals
    /// half-open on the display axis: the base before `end` must be in the
    /// set, and the result is one past its rank.
    pub fn project_end(&self, end: Position) -> Option<u32> {
        self.project(end.checked_sub(1)?).map(|rank| rank + 1)
    }

    /// Display coordinates that start a new contiguous genomic run,
    /// ascending. Empty when the whole set is one run.
    pub fn jump_positions(&self) -> &[u32] {
        &self.jumps
    }

    /// Project the transcript's own landmarks. Every landmark of a
    /// transcript lies inside its padded position set, so a miss here means
    /// the projection was built for a different transcript or padding.
    pub fn project_transcript(&self, transcript: &Transcript) -> Result<ProjectedTranscript> {
        let tx_begin = self.require(transcript.tx_begin, "transcript begin")?;
        let tx_end = self.require_end(transcript.tx_end, "transcript end")?;
        let cds = if transcript.is_coding() {
            Some((
                self.require(transcript.cds_begin, "CDS begin")?,
                self.require_end(transcript.cds_end, "CDS end")?,
            ))
        } else {
            None
        };
        let mut exons = Vec::with_capacity(transcript.exons.len());
        for exon in &transcript.exons {
            exons.push((
                self.require(exon.begin, "exon begin")?,
                self.require_end(exon.end, "exon end")?,
            ));
        }
        Ok(ProjectedTranscript {
            tx_begin,
            tx_end,
            cds,
            exons,
        })
    }

    /// Place matrix rows on the display axis. Rows outside the projection
    /// domain are dropped, never defaulted.
    pub fn project_matrix(&self, matrix: &CoverageMatrix) -> Vec<ProjectedRow> {
        matrix
            .rows
            .iter()
            .filter_map(|row| {
                // rows are 1-based, the projection domain is 0-based
                self.project(row.pos - 1).map(|x| ProjectedRow {
                    x,
                    exon_no: row.exon_no,
                    depths: row.depths.clone(),
                })
            })
            .collect()
    }

    fn require(&self, pos: Position, what: &str) -> Result<u32> {
        self.project(pos).ok_or_else(|| {
            CoverageError::InvariantViolation(format!(
                "{} at {} is outside the projection domain",
                what, pos
            ))
        })
    }

    fn require_end(&self, end: Position, what: &str) -> Result<u32> {
        self.project_end(end).ok_or_else(|| {
            CoverageError::InvariantViolation(format!(
                "{} at {} is outside the projection domain",
                what, end
            ))
        })
    }
}
