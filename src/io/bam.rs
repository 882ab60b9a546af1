//! BAM-backed depth extraction
//!
//! Reads alignment records through the noodles library. Region queries
//! need a `.bai` index next to the BAM file; header inspection does not.

use std::fs::File;
use std::io;
use std::path::Path;

use noodles::bam;
use noodles::bgzf;
use noodles::core::Region;
use noodles::sam::{self, alignment::record::cigar::op::Kind};

use crate::coverage::DepthSource;
use crate::error::Result;
use crate::types::Position;

/// One `@RG` line from a BAM header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroup {
    pub id: String,
    pub sample: Option<String>,
}

/// Read the `@RG` lines of a BAM header.
pub fn read_read_groups(path: &Path) -> Result<Vec<ReadGroup>> {
    // bam::io::Reader::new wraps its input in a BGZF decoder itself
    let mut reader = File::open(path).map(bam::io::Reader::new)?;
    let header = reader.read_header()?;

    let mut writer = sam::io::Writer::new(Vec::new());
    writer.write_header(&header)?;
    let text = String::from_utf8_lossy(writer.get_ref()).into_owned();
    Ok(parse_read_groups(&text))
}

fn parse_read_groups(text: &str) -> Vec<ReadGroup> {
    let mut groups = Vec::new();
    for line in text.lines() {
        if !line.starts_with("@RG") {
            continue;
        }
        let mut id = None;
        let mut sample = None;
        for field in line.split('\t').skip(1) {
            match field.split_once(':') {
                Some(("ID", value)) => id = Some(value.to_string()),
                Some(("SM", value)) => sample = Some(value.to_string()),
                _ => {}
            }
        }
        if let Some(id) = id {
            groups.push(ReadGroup { id, sample });
        }
    }
    groups
}

/// Depth source backed by an indexed BAM file.
///
/// Depth at a base is the number of overlapping alignment match operations
/// (`M`, `=`, `X`); deletions and splice gaps inside a read do not count.
/// Unmapped, secondary, QC-fail and duplicate records are skipped.
pub struct BamDepthSource {
    reader: bam::io::IndexedReader<bgzf::Reader<File>>,
    header: sam::Header,
}

impl BamDepthSource {
    /// Open `path` together with its `.bai` index.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = bam::io::indexed_reader::Builder::default().build_from_path(path)?;
        let header = reader.read_header()?;
        Ok(Self { reader, header })
    }
}

impl DepthSource for BamDepthSource {
    fn pileup(&mut self, chrom: &str, begin: Position, end: Position) -> Result<Vec<(Position, u32)>> {
        if begin >= end {
            return Ok(Vec::new());
        }
        let region = query_region(chrom, begin, end)?;
        let mut depths = vec![0u32; (end - begin) as usize];

        for result in self.reader.query(&self.header, &region)? {
            let record = result?;
            let flags = record.flags();
            if flags.is_unmapped()
                || flags.is_secondary()
                || flags.is_qc_fail()
                || flags.is_duplicate()
            {
                continue;
            }
            let Some(start) = record.alignment_start() else {
                continue;
            };
            let start = start?.get() as Position - 1;

            let mut ops = Vec::new();
            for op in record.cigar().iter() {
                let op = op?;
                ops.push((op.kind(), op.len()));
            }
            add_record_depth(&mut depths, begin, end, start, &ops);
        }

        Ok(depths
            .into_iter()
            .enumerate()
            .filter(|(_, depth)| *depth > 0)
            .map(|(offset, depth)| (begin + offset as Position, depth))
            .collect())
    }
}

/// Accumulate one record's aligned bases into `depths`, which covers the
/// half-open window `[begin, end)`. `start` is the record's 0-based
/// alignment start.
fn add_record_depth(
    depths: &mut [u32],
    begin: Position,
    end: Position,
    start: Position,
    ops: &[(Kind, usize)],
) {
    let mut ref_pos = start;
    for &(kind, len) in ops {
        let len = len as Position;
        match kind {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                let lo = ref_pos.max(begin);
                let hi = (ref_pos + len).min(end);
                for pos in lo..hi {
                    depths[(pos - begin) as usize] += 1;
                }
                ref_pos += len;
            }
            Kind::Deletion | Kind::Skip => {
                ref_pos += len;
            }
            // Insertions, clips and pads do not consume reference bases.
            _ => {}
        }
    }
}

fn query_region(chrom: &str, begin: Position, end: Position) -> io::Result<Region> {
    let start = noodles::core::Position::try_from(begin as usize + 1)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let stop = noodles::core::Position::try_from(end as usize)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    Ok(Region::new(chrom.to_string(), start..=stop))
}
