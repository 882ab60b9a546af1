//! Gene model: strands, exons, transcripts, and the transcript catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{CoverageError, Result};

/// Genomic position, 0-based.
pub type Position = u64;

/// Transcript orientation on the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse the `+`/`-` convention used by annotation files.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Forward),
            '-' => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One exon, 0-based half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exon {
    /// Start position (0-based, inclusive)
    pub begin: Position,
    /// End position (0-based, exclusive)
    pub end: Position,
}

impl Exon {
    pub fn new(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    /// Number of bases in the exon.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// True when `pos` (0-based) lies inside the exon.
    pub fn contains(&self, pos: Position) -> bool {
        self.begin <= pos && pos < self.end
    }
}

/// A transcript with its exon structure and CDS bounds.
///
/// All coordinates are 0-based half-open on the reference. Exons are stored
/// in ascending genomic order regardless of strand; `cds_begin == cds_end`
/// marks a non-coding transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Gene symbol the transcript belongs to (e.g. `TP53`).
    pub gene_symbol: String,
    /// Transcript accession (e.g. `NM_000546`).
    pub accession: String,
    /// Chromosome name without a `chr` prefix.
    pub chrom: String,
    pub strand: Strand,
    pub tx_begin: Position,
    pub tx_end: Position,
    pub cds_begin: Position,
    pub cds_end: Position,
    /// Exons in ascending genomic order.
    pub exons: Vec<Exon>,
}

impl Transcript {
    pub fn is_coding(&self) -> bool {
        self.cds_begin != self.cds_end
    }

    pub fn exon_count(&self) -> usize {
        self.exons.len()
    }

    /// 1-based exon number for the exon at `index` in ascending genomic
    /// order. Forward-strand transcripts count up from the lowest
    /// coordinate; reverse-strand transcripts count down, so exon 1 is
    /// always the transcript's first exon in reading direction.
    pub fn exon_number(&self, index: usize) -> u32 {
        match self.strand {
            Strand::Forward => index as u32 + 1,
            Strand::Reverse => (self.exons.len() - index) as u32,
        }
    }

    /// Inverse of [`exon_number`](Self::exon_number): the ascending-order
    /// index of the exon carrying `exon_no`, or `None` if out of range.
    pub fn exon_index(&self, exon_no: u32) -> Option<usize> {
        let count = self.exons.len() as u32;
        if exon_no == 0 || exon_no > count {
            return None;
        }
        Some(match self.strand {
            Strand::Forward => (exon_no - 1) as usize,
            Strand::Reverse => (count - exon_no) as usize,
        })
    }

    /// Check the structural invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<()> {
        if self.exons.is_empty() {
            return Err(self.invalid("transcript has no exons"));
        }
        if self.tx_begin >= self.tx_end {
            return Err(self.invalid("transcript span is empty"));
        }
        let mut prev_end = None;
        for exon in &self.exons {
            if exon.is_empty() {
                return Err(self.invalid(&format!("empty exon [{}, {})", exon.begin, exon.end)));
            }
            if exon.begin < self.tx_begin || exon.end > self.tx_end {
                return Err(self.invalid(&format!(
                    "exon [{}, {}) outside transcript span [{}, {})",
                    exon.begin, exon.end, self.tx_begin, self.tx_end
                )));
            }
            if let Some(prev) = prev_end {
                if exon.begin < prev {
                    return Err(self.invalid("exons are unsorted or overlapping"));
                }
            }
            prev_end = Some(exon.end);
        }
        if self.is_coding()
            && (self.cds_begin < self.tx_begin
                || self.cds_end > self.tx_end
                || self.cds_begin > self.cds_end)
        {
            return Err(self.invalid(&format!(
                "CDS [{}, {}) outside transcript span [{}, {})",
                self.cds_begin, self.cds_end, self.tx_begin, self.tx_end
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> CoverageError {
        CoverageError::InvariantViolation(format!("transcript {}: {}", self.accession, reason))
    }
}

/// Read-only lookup of transcripts by gene symbol and by accession.
#[derive(Debug, Default)]
pub struct TranscriptCatalog {
    by_gene: HashMap<String, Vec<Arc<Transcript>>>,
    by_accession: HashMap<String, Arc<Transcript>>,
}

impl TranscriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated transcript. Accessions are unique; inserting a
    /// duplicate is an error.
    pub fn insert(&mut self, transcript: Transcript) -> Result<()> {
        transcript.validate()?;
        if self.by_accession.contains_key(&transcript.accession) {
            return Err(CoverageError::InvariantViolation(format!(
                "duplicate transcript accession: {}",
                transcript.accession
            )));
        }
        let transcript = Arc::new(transcript);
        self.by_gene
            .entry(transcript.gene_symbol.clone())
            .or_default()
            .push(Arc::clone(&transcript));
        self.by_accession
            .insert(transcript.accession.clone(), transcript);
        Ok(())
    }

    pub fn contains_accession(&self, accession: &str) -> bool {
        self.by_accession.contains_key(accession)
    }

    /// Transcripts of a gene, in insertion order.
    pub fn gene(&self, symbol: &str) -> Option<&[Arc<Transcript>]> {
        self.by_gene.get(symbol).map(|v| v.as_slice())
    }

    pub fn transcript(&self, accession: &str) -> Option<&Arc<Transcript>> {
        self.by_accession.get(accession)
    }

    pub fn gene_symbols(&self) -> impl Iterator<Item = &str> {
        self.by_gene.keys().map(|s| s.as_str())
    }

    /// Number of transcripts in the catalog.
    pub fn len(&self) -> usize {
        self.by_accession.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_accession.is_empty()
    }
}

/// Two-exon coding transcript on chromosome 1, shared by tests across the
/// crate: span [100, 230), CDS [120, 220), exons [100, 150) and [200, 230).
#[cfg(test)]
pub(crate) fn two_exon_transcript(strand: Strand) -> Transcript {
    Transcript {
        gene_symbol: "GENE1".to_string(),
        accession: "NM_0001".to_string(),
        chrom: "1".to_string(),
        strand,
        tx_begin: 100,
        tx_end: 230,
        cds_begin: 120,
        cds_end: 220,
        exons: vec![Exon::new(100, 150), Exon::new(200, 230)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_conversions() {
        assert_eq!(Strand::from_char('+'), Some(Strand::Forward));
        assert_eq!(Strand::from_char('-'), Some(Strand::Reverse));
        assert_eq!(Strand::from_char('.'), None);
        assert_eq!(Strand::Forward.to_string(), "+");
        assert_eq!(Strand::Reverse.to_string(), "-");
    }

    #[test]
    fn test_exon_contains() {
        let exon = Exon::new(100, 150);
        assert_eq!(exon.len(), 50);
        assert!(exon.contains(100));
        assert!(exon.contains(149));
        assert!(!exon.contains(150));
        assert!(!exon.contains(99));
    }

    #[test]
    fn test_exon_number_forward() {
        let tx = two_exon_transcript(Strand::Forward);
        assert_eq!(tx.exon_number(0), 1);
        assert_eq!(tx.exon_number(1), 2);
    }

    #[test]
    fn test_exon_number_reverse() {
        let tx = two_exon_transcript(Strand::Reverse);
        assert_eq!(tx.exon_number(0), 2);
        assert_eq!(tx.exon_number(1), 1);
    }

    #[test]
    fn test_exon_index_roundtrip() {
        for strand in [Strand::Forward, Strand::Reverse] {
            let tx = two_exon_transcript(strand);
            for index in 0..tx.exon_count() {
                assert_eq!(tx.exon_index(tx.exon_number(index)), Some(index));
            }
            assert_eq!(tx.exon_index(0), None);
            assert_eq!(tx.exon_index(3), None);
        }
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(two_exon_transcript(Strand::Forward).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlapping_exons() {
        let mut tx = two_exon_transcript(Strand::Forward);
        tx.exons = vec![Exon::new(100, 150), Exon::new(140, 230)];
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_exon_outside_span() {
        let mut tx = two_exon_transcript(Strand::Forward);
        tx.exons = vec![Exon::new(50, 150), Exon::new(200, 230)];
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_cds_outside_span() {
        let mut tx = two_exon_transcript(Strand::Forward);
        tx.cds_end = 500;
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_noncoding_cds_is_allowed() {
        let mut tx = two_exon_transcript(Strand::Forward);
        tx.cds_begin = 100;
        tx.cds_end = 100;
        assert!(tx.validate().is_ok());
        assert!(!tx.is_coding());
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = TranscriptCatalog::new();
        catalog.insert(two_exon_transcript(Strand::Forward)).unwrap();

        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains_accession("NM_0001"));
        assert!(catalog.transcript("NM_0001").is_some());
        assert!(catalog.transcript("NM_9999").is_none());

        let transcripts = catalog.gene("GENE1").unwrap();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0].accession, "NM_0001");
        assert!(catalog.gene("GENE2").is_none());
    }

    #[test]
    fn test_catalog_rejects_duplicate_accession() {
        let mut catalog = TranscriptCatalog::new();
        catalog.insert(two_exon_transcript(Strand::Forward)).unwrap();
        let err = catalog.insert(two_exon_transcript(Strand::Reverse));
        assert!(matches!(err, Err(CoverageError::InvariantViolation(_))));
        assert_eq!(catalog.len(), 1);
    }
}
