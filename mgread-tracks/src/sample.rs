//! Sample BigBed and BigWig files for the `test` user.

use std::collections::HashMap;
use std::path::Path;

use bigtools::beddata::BedParserStreamingIterator;
use bigtools::{BedEntry, BigBedWrite, BigWigWrite, Value};
use tokio::runtime;
use tracing::info;

use mgread_core::{ReaderError, Result};

pub const SAMPLE_BIGBED_FIXTURE: &str = "sample.bb";
pub const SAMPLE_BIGWIG_FIXTURE: &str = "sample.bw";

/// Chromosomes of the sample files (GRCh38 lengths).
pub const SAMPLE_CHROMS: [(&str, u32); 2] = [("19", 58_617_616), ("X", 156_040_895)];

/// Span covered by the sample entries on every chromosome.
const SAMPLE_START: u32 = 2_990_000;
const SAMPLE_END: u32 = 3_010_000;
const SAMPLE_STEP: u32 = 250;

fn chrom_sizes() -> HashMap<String, u32> {
    SAMPLE_CHROMS
        .iter()
        .map(|(name, len)| (name.to_string(), *len))
        .collect()
}

fn build_runtime() -> Result<runtime::Runtime> {
    runtime::Builder::new_multi_thread()
        .worker_threads(
            std::thread::available_parallelism()
                .map(|c| c.into())
                .unwrap_or(1),
        )
        .build()
        .map_err(ReaderError::from)
}

fn prepare(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

///
/// Write a small BigBed file: peaks every 250 bp around 3 Mb of each
/// sample chromosome, with name, score and strand columns.
///
pub fn write_sample_bigbed(path: &Path) -> Result<()> {
    prepare(path)?;

    let mut entries = vec![];
    // sorted by chromosome name, then start
    let mut chroms: Vec<_> = SAMPLE_CHROMS.iter().map(|(name, _)| *name).collect();
    chroms.sort_unstable();
    for chrom in chroms {
        for (n, start) in (SAMPLE_START..SAMPLE_END).step_by(SAMPLE_STEP as usize).enumerate() {
            let strand = if n % 2 == 0 { '+' } else { '-' };
            entries.push(Ok::<_, std::io::Error>((
                chrom.to_string(),
                BedEntry {
                    start,
                    end: start + SAMPLE_STEP / 2,
                    rest: format!("peak_{}_{}\t{}\t{}", chrom, n, (n * 37) % 1000, strand),
                },
            )));
        }
    }

    let mut writer = BigBedWrite::create_file(path.to_string_lossy().to_string(), chrom_sizes())
        .map_err(|e| ReaderError::BackingStore(format!("cannot create bigBed: {}", e)))?;
    writer.options.max_zooms = 8;

    let data = BedParserStreamingIterator::wrap_iter(entries.into_iter(), true);
    writer
        .write(data, build_runtime()?)
        .map_err(ReaderError::backing_store)?;

    info!(path = %path.display(), "Wrote sample bigBed");
    Ok(())
}

///
/// Write a small BigWig file with consecutive 50 bp intervals over the same
/// span as the sample BigBed.
///
pub fn write_sample_bigwig(path: &Path) -> Result<()> {
    prepare(path)?;

    let mut values = vec![];
    let mut chroms: Vec<_> = SAMPLE_CHROMS.iter().map(|(name, _)| *name).collect();
    chroms.sort_unstable();
    for chrom in chroms {
        for (n, start) in (SAMPLE_START..SAMPLE_END).step_by(50).enumerate() {
            values.push(Ok::<_, std::io::Error>((
                chrom.to_string(),
                Value {
                    start,
                    end: start + 50,
                    value: ((n % 20) as f32) * 0.5,
                },
            )));
        }
    }

    let mut writer = BigWigWrite::create_file(path.to_string_lossy().to_string(), chrom_sizes())
        .map_err(|e| ReaderError::BackingStore(format!("cannot create bigWig: {}", e)))?;
    writer.options.max_zooms = 8;

    let data = BedParserStreamingIterator::wrap_iter(values.into_iter(), true);
    writer
        .write(data, build_runtime()?)
        .map_err(ReaderError::backing_store)?;

    info!(path = %path.display(), "Wrote sample bigWig");
    Ok(())
}
