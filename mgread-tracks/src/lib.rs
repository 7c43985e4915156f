//! # Interval tracks
//!
//! Read-only access to BigBed and BigWig files: chromosome sizes, file
//! header, and range queries rendered as text (bed/wig lines) or as rows.
//!
//! Range queries never fail. A chromosome missing from the file or a
//! corrupt block is logged and yields an empty result.
pub mod bigbed;
pub mod bigwig;
pub mod sample;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use mgread_core::{ReaderConfig, ReaderError, ResolvedFile, Result};

pub use bigbed::BigBedReader;
pub use bigwig::BigWigReader;
pub use sample::{SAMPLE_BIGBED_FIXTURE, SAMPLE_BIGWIG_FIXTURE, write_sample_bigbed, write_sample_bigwig};

///
/// How a range query is rendered.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFormat {
    /// `chrom\tstart\tend\trest` lines (BigBed)
    Bed,
    /// `start\tend\tvalue` lines (BigWig)
    Wig,
    /// One row per entry
    List,
}

impl FromStr for RangeFormat {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bed" => Ok(RangeFormat::Bed),
            "wig" => Ok(RangeFormat::Wig),
            // `json` is what older clients send for the row form
            "list" | "json" => Ok(RangeFormat::List),
            other => Err(ReaderError::InvalidArgument(format!(
                "unknown range format '{}'",
                other
            ))),
        }
    }
}

///
/// One BigBed entry as a row: chromosome, start, end, then the remaining
/// columns split on tabs.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedRow {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub fields: Vec<String>,
}

impl Serialize for BedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3 + self.fields.len()))?;
        seq.serialize_element(&self.chrom)?;
        seq.serialize_element(&self.start)?;
        seq.serialize_element(&self.end)?;
        for field in &self.fields {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}

/// One BigWig interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WigValue {
    pub start: u32,
    pub end: u32,
    pub value: f32,
}

///
/// Result of a range query.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RangeOutput {
    Text(String),
    Bed(Vec<BedRow>),
    Wig(Vec<WigValue>),
}

impl RangeOutput {
    pub fn is_empty(&self) -> bool {
        match self {
            RangeOutput::Text(text) => text.trim().is_empty(),
            RangeOutput::Bed(rows) => rows.is_empty(),
            RangeOutput::Wig(values) => values.is_empty(),
        }
    }
}

///
/// Summary of a track file header.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackHeader {
    pub version: u16,
    pub zoom_levels: usize,
    pub field_count: u16,
    pub defined_field_count: u16,
    pub chrom_count: usize,
}

///
/// Resolve `(user_id, file_id)` to a track file. For the `test` user the
/// fixture `fixture_name` is written with `generate` if it does not exist.
///
pub(crate) fn resolve_track<F>(
    config: &ReaderConfig,
    user_id: &str,
    file_id: &str,
    fixture_name: &str,
    generate: F,
) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<()>,
{
    match config.resolve(user_id, file_id, fixture_name)? {
        ResolvedFile::Fixture(path) => {
            if !path.is_file() {
                generate(&path)?;
            }
            Ok(path)
        }
        ResolvedFile::Catalog(path) => Ok(path),
    }
}

pub(crate) fn check_exists(path: &Path) -> Result<()> {
    match path.is_file() {
        true => Ok(()),
        false => Err(ReaderError::NotFound(format!(
            "track file {}",
            path.display()
        ))),
    }
}
