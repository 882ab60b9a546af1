//! Joining per-sample coverage tables into one wide matrix

use log::debug;
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageTable;
use crate::error::{CoverageError, Result};
use crate::types::Transcript;

/// One genomic position across every joined sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    /// Genomic position, 1-based.
    pub pos: u64,
    /// 1-based exon number in transcript orientation.
    pub exon_no: u32,
    /// Depth per sample, aligned with the matrix `samples` header.
    pub depths: Vec<u32>,
}

/// Wide per-position depth matrix, one column per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMatrix {
    /// Chromosome the rows live on.
    pub chrom: String,
    /// Column header: sample display names in join order.
    pub samples: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

impl CoverageMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every row lying outside the exon it is labeled with.
    ///
    /// This strips padding rows, and with them the duplicates a
    /// neighboring window may have emitted over this exon's bases, so
    /// each exonic base keeps exactly one row afterwards.
    pub fn retain_on_target(&mut self, transcript: &Transcript) {
        self.rows.retain(|row| {
            transcript
                .exon_index(row.exon_no)
                .map_or(false, |index| transcript.exons[index].contains(row.pos - 1))
        });
    }
}

/// Join per-sample tables into a wide matrix.
///
/// The first table's `(pos, exon_no)` sequence is canonical. Every table
/// must describe the same chromosome and the same key sequence; a mismatch
/// means the tables were extracted from different requests and the join
/// refuses rather than dropping rows.
pub fn join_tables(tables: &[CoverageTable]) -> Result<CoverageMatrix> {
    let first = tables.first().ok_or_else(|| {
        CoverageError::InvariantViolation("cannot join zero coverage tables".to_string())
    })?;

    for table in &tables[1..] {
        if table.chrom != first.chrom {
            return Err(CoverageError::InvariantViolation(format!(
                "joined tables disagree on chromosome: {} vs {}",
                first.chrom, table.chrom
            )));
        }
        if table.rows.len() != first.rows.len() {
            return Err(CoverageError::InvariantViolation(format!(
                "joined tables disagree on row count: sample {} has {} rows, sample {} has {}",
                first.sample,
                first.rows.len(),
                table.sample,
                table.rows.len()
            )));
        }
    }

    let mut rows = Vec::with_capacity(first.rows.len());
    for (i, base) in first.rows.iter().enumerate() {
        let mut depths = Vec::with_capacity(tables.len());
        for table in tables {
            let row = &table.rows[i];
            if row.pos != base.pos || row.exon_no != base.exon_no {
                return Err(CoverageError::InvariantViolation(format!(
                    "joined tables disagree at row {}: sample {} has ({}, exon {}), sample {} has ({}, exon {})",
                    i, first.sample, base.pos, base.exon_no, table.sample, row.pos, row.exon_no
                )));
            }
            depths.push(row.depth);
        }
        rows.push(MatrixRow {
            pos: base.pos,
            exon_no: base.exon_no,
            depths,
        });
    }

    debug!(
        "joined {} samples into {} rows on {}",
        tables.len(),
        rows.len(),
        first.chrom
    );
    Ok(CoverageMatrix {
        chrom: first.chrom.clone(),
        samples: tables.iter().map(|t| t.sample.clone()).collect(),
        rows,
    })
}
