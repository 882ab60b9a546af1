//! Exon interval index: containment, padded scan windows, and position sets

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{Exon, Position};

/// A padded scan window around one exon, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddedWindow {
    /// Index of the source exon in ascending genomic order.
    pub exon_index: usize,
    pub begin: Position,
    pub end: Position,
}

impl PaddedWindow {
    /// Number of positions in the window.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }
}

/// Interval queries over one transcript's exons.
///
/// Exons must be sorted by begin and pairwise non-overlapping, which holds
/// for any catalog-validated transcript.
#[derive(Debug, Clone)]
pub struct ExonIntervals {
    exons: Vec<Exon>,
}

impl ExonIntervals {
    pub fn new(exons: &[Exon]) -> Self {
        Self {
            exons: exons.to_vec(),
        }
    }

    pub fn exon_count(&self) -> usize {
        self.exons.len()
    }

    /// Total number of exonic bases.
    pub fn base_count(&self) -> u64 {
        self.exons.iter().map(|e| e.len()).sum()
    }

    /// True when `pos` (0-based) lies inside an exon, padding excluded.
    pub fn contains(&self, pos: Position) -> bool {
        self.exons
            .binary_search_by(|exon| {
                if exon.end <= pos {
                    Ordering::Less
                } else if exon.begin > pos {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// One padded window per exon, ascending. `begin` clamps at zero near
    /// the chromosome start; windows of neighboring exons may overlap.
    pub fn windows(&self, padding: u32) -> Vec<PaddedWindow> {
        let pad = u64::from(padding);
        self.exons
            .iter()
            .enumerate()
            .map(|(exon_index, exon)| PaddedWindow {
                exon_index,
                begin: exon.begin.saturating_sub(pad),
                end: exon.end + pad,
            })
            .collect()
    }

    /// Padded windows with overlapping or abutting neighbors merged into
    /// maximal runs of contiguous positions.
    pub fn merged_windows(&self, padding: u32) -> Vec<(Position, Position)> {
        let mut merged: Vec<(Position, Position)> = Vec::with_capacity(self.exons.len());
        for window in self.windows(padding) {
            match merged.last_mut() {
                Some(last) if window.begin <= last.1 => last.1 = last.1.max(window.end),
                _ => merged.push((window.begin, window.end)),
            }
        }
        merged
    }

    /// Every position covered by a padded window: strictly ascending, no
    /// duplicates. With `padding == 0` this is exactly the exonic positions.
    pub fn positions(&self, padding: u32) -> Vec<Position> {
        let merged = self.merged_windows(padding);
        let total: u64 = merged.iter().map(|(b, e)| e - b).sum();
        let mut positions = Vec::with_capacity(total as usize);
        for (begin, end) in merged {
            positions.extend(begin..end);
        }
        positions
    }
}
