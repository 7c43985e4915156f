use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bigtools::utils::reopen::ReopenableFile;
use bigtools::{BedEntry, BigBedRead};
use tracing::{debug, warn};

use mgread_core::{ReaderConfig, ReaderError, Result};

use crate::sample::{SAMPLE_BIGBED_FIXTURE, write_sample_bigbed};
use crate::{BedRow, RangeFormat, RangeOutput, TrackHeader, check_exists, resolve_track};

///
/// Reader over one BigBed file.
///
pub struct BigBedReader {
    path: PathBuf,
    inner: BigBedRead<ReopenableFile>,
}

impl BigBedReader {
    ///
    /// Open a BigBed file.
    ///
    /// # Arguments
    /// - path: path to the `.bb` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_exists(path)?;
        let inner = BigBedRead::open_file(&*path.to_string_lossy()).map_err(|e| {
            ReaderError::BackingStore(format!("cannot open bigBed {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened bigBed");
        Ok(BigBedReader {
            path: path.to_path_buf(),
            inner,
        })
    }

    ///
    /// Open the BigBed file behind `(user_id, file_id)`. The `test` user
    /// gets the sample file, generated on first use.
    ///
    pub fn open_source(config: &ReaderConfig, user_id: &str, file_id: &str) -> Result<Self> {
        let path = resolve_track(
            config,
            user_id,
            file_id,
            SAMPLE_BIGBED_FIXTURE,
            write_sample_bigbed,
        )?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Chromosome names and lengths.
    pub fn chroms(&self) -> BTreeMap<String, u32> {
        self.inner
            .chroms()
            .iter()
            .map(|c| (c.name.clone(), c.length))
            .collect()
    }

    pub fn header(&self) -> TrackHeader {
        let info = self.inner.info();
        TrackHeader {
            version: info.header.version,
            zoom_levels: info.zoom_headers.len(),
            field_count: info.header.field_count,
            defined_field_count: info.header.defined_field_count,
            chrom_count: info.chrom_info.len(),
        }
    }

    ///
    /// Entries overlapping `[start, end)` on `chrom`. Read errors are logged
    /// and end the listing early.
    ///
    pub fn entries(&mut self, chrom: &str, start: u32, end: u32) -> Vec<BedEntry> {
        let interval = match self.inner.get_interval(chrom, start, end) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(chrom, start, end, error = %e, "bigBed range query failed");
                return vec![];
            }
        };

        let mut entries = vec![];
        for entry in interval {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(chrom, start, end, error = %e, "Stopped reading bigBed block");
                    break;
                }
            }
        }
        entries
    }

    ///
    /// Entries overlapping `[start, end)` on `chrom`, rendered as bed text
    /// (`RangeFormat::Bed`, one line per entry with a trailing newline) or as
    /// rows (`RangeFormat::List`).
    ///
    pub fn get_range(&mut self, chrom: &str, start: u32, end: u32, format: RangeFormat) -> RangeOutput {
        let entries = self.entries(chrom, start, end);
        match format {
            RangeFormat::List => RangeOutput::Bed(
                entries
                    .into_iter()
                    .map(|e| BedRow {
                        chrom: chrom.to_string(),
                        start: e.start,
                        end: e.end,
                        fields: match e.rest.is_empty() {
                            true => vec![],
                            false => e.rest.split('\t').map(str::to_string).collect(),
                        },
                    })
                    .collect(),
            ),
            RangeFormat::Bed | RangeFormat::Wig => {
                let mut text = entries
                    .iter()
                    .map(|e| format!("{}\t{}\t{}\t{}", chrom, e.start, e.end, e.rest))
                    .collect::<Vec<_>>()
                    .join("\n");
                text.push('\n');
                RangeOutput::Text(text)
            }
        }
    }
}
