use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bigtools::BigWigRead;
use bigtools::utils::reopen::ReopenableFile;
use tracing::{debug, warn};

use mgread_core::{ReaderConfig, ReaderError, Result};

use crate::sample::{SAMPLE_BIGWIG_FIXTURE, write_sample_bigwig};
use crate::{RangeFormat, RangeOutput, TrackHeader, WigValue, check_exists, resolve_track};

///
/// Reader over one BigWig file.
///
pub struct BigWigReader {
    path: PathBuf,
    inner: BigWigRead<ReopenableFile>,
}

impl BigWigReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_exists(path)?;
        let inner = BigWigRead::open_file(&*path.to_string_lossy()).map_err(|e| {
            ReaderError::BackingStore(format!("cannot open bigWig {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened bigWig");
        Ok(BigWigReader {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn open_source(config: &ReaderConfig, user_id: &str, file_id: &str) -> Result<Self> {
        let path = resolve_track(
            config,
            user_id,
            file_id,
            SAMPLE_BIGWIG_FIXTURE,
            write_sample_bigwig,
        )?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

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

    /// Intervals overlapping `[start, end)` on `chrom`.
    pub fn values(&mut self, chrom: &str, start: u32, end: u32) -> Vec<WigValue> {
        let interval = match self.inner.get_interval(chrom, start, end) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(chrom, start, end, error = %e, "bigWig range query failed");
                return vec![];
            }
        };

        let mut values = vec![];
        for value in interval {
            match value {
                Ok(v) => values.push(WigValue {
                    start: v.start,
                    end: v.end,
                    value: v.value,
                }),
                Err(e) => {
                    warn!(chrom, start, end, error = %e, "Stopped reading bigWig block");
                    break;
                }
            }
        }
        values
    }

    ///
    /// Intervals overlapping `[start, end)` on `chrom`, rendered as
    /// `start\tend\tvalue` lines (`RangeFormat::Wig`) or as rows.
    ///
    pub fn get_range(&mut self, chrom: &str, start: u32, end: u32, format: RangeFormat) -> RangeOutput {
        let values = self.values(chrom, start, end);
        match format {
            RangeFormat::List => RangeOutput::Wig(values),
            RangeFormat::Wig | RangeFormat::Bed => RangeOutput::Text(
                values
                    .iter()
                    .map(|v| format!("{}\t{}\t{}", v.start, v.end, v.value))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::TempDir;

    #[fixture]
    fn sample_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_sample_bigwig(&dir.path().join(SAMPLE_BIGWIG_FIXTURE)).unwrap();
        dir
    }

    #[rstest]
    fn test_chroms(sample_dir: TempDir) {
        let reader = BigWigReader::open(sample_dir.path().join(SAMPLE_BIGWIG_FIXTURE)).unwrap();
        assert!(reader.chroms().contains_key("19"));
        assert!(reader.header().chrom_count >= 1);
    }

    #[rstest]
    fn test_header_counts_zoom_levels(sample_dir: TempDir) {
        let reader = BigWigReader::open(sample_dir.path().join(SAMPLE_BIGWIG_FIXTURE)).unwrap();
        let header = reader.header();
        assert!(header.version >= 3);
        assert!(header.zoom_levels <= 8);
        assert_eq!(header.zoom_levels, reader.inner.info().zoom_headers.len());
        assert_eq!(header.chrom_count, reader.chroms().len());
    }

    #[rstest]
    fn test_get_range_wig(sample_dir: TempDir) {
        let mut reader =
            BigWigReader::open(sample_dir.path().join(SAMPLE_BIGWIG_FIXTURE)).unwrap();
        let RangeOutput::Text(text) =
            reader.get_range("19", 3_000_000, 3_001_000, RangeFormat::Wig)
        else {
            panic!("expected text output");
        };
        let lines: Vec<&str> = text.lines().collect();
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| l.split('\t').count() == 3));
    }

    #[rstest]
    fn test_get_range_list(sample_dir: TempDir) {
        let mut reader =
            BigWigReader::open(sample_dir.path().join(SAMPLE_BIGWIG_FIXTURE)).unwrap();
        let RangeOutput::Wig(values) =
            reader.get_range("19", 3_000_000, 3_001_000, RangeFormat::List)
        else {
            panic!("expected values");
        };
        assert!(!values.is_empty());
        assert!(values.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[rstest]
    fn test_unknown_chromosome_is_empty(sample_dir: TempDir) {
        let mut reader =
            BigWigReader::open(sample_dir.path().join(SAMPLE_BIGWIG_FIXTURE)).unwrap();
        assert_eq!(
            reader.get_range("chrUn", 0, 100, RangeFormat::Wig),
            RangeOutput::Text(String::new())
        );
    }
}
