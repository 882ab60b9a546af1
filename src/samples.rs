//! Sample discovery and registration
//!
//! Samples are the alignment files coverage is extracted from, plus one
//! built-in synthetic sample that needs no file at all. Each sample gets an
//! opaque stable id (hashed from its path), a display name taken from the
//! BAM header's single read group, and a backing that tells the engine how
//! to read it.

use log::{info, warn};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh64::xxh64;

use crate::error::{CoverageError, Result};
use crate::io::bam::read_read_groups;

/// Identifier of the built-in deterministic sample.
pub const SYNTHETIC_SAMPLE_ID: &str = "builtin-synthetic";

/// What backs a registered sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    /// Deterministic depth ramp, no file on disk.
    Synthetic,
    /// Indexed BAM file.
    Bam(PathBuf),
    /// Present on disk but not usable; the reason is reported when the
    /// sample is requested.
    Unsupported { path: PathBuf, reason: String },
}

/// A registered sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    /// Opaque stable id, hashed from the path as configured.
    pub id: String,
    /// Display name shown to users and used as a column header.
    pub name: String,
    pub backing: Backing,
}

/// Registry of the samples the engine may serve.
///
/// Always contains the synthetic sample. BAM files are added one at a time
/// or through directory discovery; ids stay stable across runs for the same
/// configured paths.
#[derive(Debug)]
pub struct SampleRegistry {
    records: BTreeMap<String, SampleRecord>,
    name_strip: Option<Regex>,
}

impl SampleRegistry {
    pub fn new() -> Self {
        let mut records = BTreeMap::new();
        records.insert(
            SYNTHETIC_SAMPLE_ID.to_string(),
            SampleRecord {
                id: SYNTHETIC_SAMPLE_ID.to_string(),
                name: "synthetic".to_string(),
                backing: Backing::Synthetic,
            },
        );
        Self {
            records,
            name_strip: None,
        }
    }

    /// Strip `pattern` matches from display names of registered samples,
    /// e.g. a sequencing-run suffix shared by a whole cohort.
    pub fn with_name_strip(mut self, pattern: Regex) -> Self {
        self.name_strip = Some(pattern);
        self
    }

    /// Id of the built-in synthetic sample.
    pub fn synthetic_id(&self) -> &str {
        SYNTHETIC_SAMPLE_ID
    }

    /// Look up a sample by id.
    pub fn get(&self, id: &str) -> Result<&SampleRecord> {
        self.records
            .get(id)
            .ok_or_else(|| CoverageError::UnknownSample(id.to_string()))
    }

    /// All records, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &SampleRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Register one BAM file and return its id.
    ///
    /// The display name comes from the `SM` field of the header's single
    /// read group, falling back to the file stem. A file with zero or
    /// several read groups is registered as unsupported so that requests
    /// for it fail with the reason instead of a silent absence.
    pub fn register_bam(&mut self, path: &Path) -> Result<String> {
        let id = path_id(path);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.clone());

        let groups = read_read_groups(path)?;
        let record = if groups.len() == 1 {
            let raw = groups
                .into_iter()
                .next()
                .and_then(|group| group.sample)
                .unwrap_or(stem);
            SampleRecord {
                id: id.clone(),
                name: self.strip_name(&raw),
                backing: Backing::Bam(path.to_path_buf()),
            }
        } else {
            let reason = format!("expected exactly one read group, found {}", groups.len());
            warn!("sample {}: {}", path.display(), reason);
            SampleRecord {
                id: id.clone(),
                name: self.strip_name(&stem),
                backing: Backing::Unsupported {
                    path: path.to_path_buf(),
                    reason,
                },
            }
        };
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    /// Register every `.bam` file directly under `dir`, in path order.
    /// Files whose header cannot be read are skipped with a warning.
    /// Returns the number of samples registered.
    pub fn discover(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "bam"))
            .collect();
        paths.sort();

        let mut added = 0;
        for path in &paths {
            match self.register_bam(path) {
                Ok(_) => added += 1,
                Err(err) => warn!("skipping {}: {}", path.display(), err),
            }
        }
        info!("discovered {} samples under {}", added, dir.display());
        Ok(added)
    }

    fn strip_name(&self, raw: &str) -> String {
        match &self.name_strip {
            Some(pattern) => pattern.replace_all(raw, "").into_owned(),
            None => raw.to_string(),
        }
    }
}

impl Default for SampleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable opaque id for a file-backed sample.
fn path_id(path: &Path) -> String {
    format!("{:016x}", xxh64(path.to_string_lossy().as_bytes(), 0))
}
