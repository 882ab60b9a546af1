//! UCSC refGene/ncbiRefSeq transcript annotation reader
//!
//! One transcript per tab-separated line, optionally gzip-compressed:
//! `bin`, `name`, `chrom`, `strand`, `txStart`, `txEnd`, `cdsStart`,
//! `cdsEnd`, `exonCount`, `exonStarts`, `exonEnds`, `score`, `name2`, ...
//! Coordinates are 0-based half-open; the exon lists are comma-separated
//! with a trailing comma. Only the columns named above are consumed.

use flate2::read::GzDecoder;
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::types::{Exon, Strand, Transcript, TranscriptCatalog};

/// Errors raised while reading annotation files.
#[derive(Debug, Error)]
pub enum RefGeneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected at least {expected} tab-separated fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid {field}: {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: {starts} exon starts but {ends} exon ends")]
    ExonListMismatch {
        line: usize,
        starts: usize,
        ends: usize,
    },

    #[error("line {line}: {reason}")]
    InvalidTranscript { line: usize, reason: String },
}

const MIN_FIELDS: usize = 13;

/// Streaming reader over refGene-style annotation records.
pub struct RefGeneReader<R> {
    reader: R,
}

impl RefGeneReader<Box<dyn BufRead>> {
    /// Open a plain or `.gz` annotation file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RefGeneError> {
        let file = File::open(&path)?;
        let gzipped = path.as_ref().extension().map_or(false, |ext| ext == "gz");
        let reader: Box<dyn BufRead> = if gzipped {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> RefGeneReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read every record into a catalog keyed by gene symbol and accession.
    ///
    /// Empty lines and `#` comments are ignored. Duplicate accessions (alt
    /// contigs, pseudoautosomal copies) keep the first record seen and log
    /// the rest; malformed lines are hard errors carrying the line number.
    pub fn read_catalog(self) -> Result<TranscriptCatalog, RefGeneError> {
        let mut catalog = TranscriptCatalog::new();
        let mut duplicates = 0usize;
        for (i, line) in self.reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let transcript = parse_line(line_no, trimmed)?;
            if catalog.contains_accession(&transcript.accession) {
                warn!(
                    "line {}: duplicate accession {}, keeping the first",
                    line_no, transcript.accession
                );
                duplicates += 1;
                continue;
            }
            catalog
                .insert(transcript)
                .map_err(|err| RefGeneError::InvalidTranscript {
                    line: line_no,
                    reason: err.to_string(),
                })?;
        }
        info!(
            "loaded {} transcripts ({} duplicates skipped)",
            catalog.len(),
            duplicates
        );
        Ok(catalog)
    }
}

/// Convenience wrapper: open `path` and read the full catalog.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<TranscriptCatalog, RefGeneError> {
    RefGeneReader::open(path)?.read_catalog()
}

fn parse_line(line_no: usize, line: &str) -> Result<Transcript, RefGeneError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return Err(RefGeneError::FieldCount {
            line: line_no,
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let accession = fields[1].to_string();
    let chrom = fields[2]
        .strip_prefix("chr")
        .unwrap_or(fields[2])
        .to_string();
    let strand = match fields[3] {
        "+" => Strand::Forward,
        "-" => Strand::Reverse,
        other => {
            return Err(RefGeneError::InvalidField {
                line: line_no,
                field: "strand",
                value: other.to_string(),
            })
        }
    };
    let tx_begin = parse_u64(line_no, "txStart", fields[4])?;
    let tx_end = parse_u64(line_no, "txEnd", fields[5])?;
    let cds_begin = parse_u64(line_no, "cdsStart", fields[6])?;
    let cds_end = parse_u64(line_no, "cdsEnd", fields[7])?;
    let starts = parse_coord_list(line_no, "exonStarts", fields[9])?;
    let ends = parse_coord_list(line_no, "exonEnds", fields[10])?;
    if starts.len() != ends.len() {
        return Err(RefGeneError::ExonListMismatch {
            line: line_no,
            starts: starts.len(),
            ends: ends.len(),
        });
    }
    let exons = starts
        .into_iter()
        .zip(ends)
        .map(|(begin, end)| Exon::new(begin, end))
        .collect();

    Ok(Transcript {
        gene_symbol: fields[12].to_string(),
        accession,
        chrom,
        strand,
        tx_begin,
        tx_end,
        cds_begin,
        cds_end,
        exons,
    })
}

fn parse_u64(line_no: usize, field: &'static str, value: &str) -> Result<u64, RefGeneError> {
    value.parse().map_err(|_| RefGeneError::InvalidField {
        line: line_no,
        field,
        value: value.to_string(),
    })
}

fn parse_coord_list(
    line_no: usize,
    field: &'static str,
    value: &str,
) -> Result<Vec<u64>, RefGeneError> {
    value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(|item| parse_u64(line_no, field, item))
        .collect()
}
