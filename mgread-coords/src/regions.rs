//! Region lookups over a bound resolution.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::Serialize;

use mgread_core::{ReaderError, Result};

use crate::index::ResolutionIndex;

///
/// A genomic span whose models occupy rows `[i, j)` of the coordinate array.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionEntry {
    pub id: String,
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub i: usize,
    pub j: usize,
}

impl RegionEntry {
    /// Positions (array rows) covered by the region.
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.i..self.j
    }

    /// Half-open overlap with `[start, end)` on `chromosome`.
    pub fn overlaps(&self, chromosome: &str, start: i64, end: i64) -> bool {
        self.chromosome == chromosome && self.start < end && self.end > start
    }
}

///
/// What to order regions by: every region of a chromosome, or the
/// chromosome a given region sits on.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionOrderKey {
    Chromosome(String),
    Region(String),
}

impl Display for RegionOrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionOrderKey::Chromosome(c) => write!(f, "chromosome {}", c),
            RegionOrderKey::Region(r) => write!(f, "region {}", r),
        }
    }
}

/// Distinct chromosome labels, sorted.
pub fn chromosomes(index: &ResolutionIndex) -> Vec<String> {
    index
        .regions
        .values()
        .map(|r| r.chromosome.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

///
/// Regions on `chromosome` overlapping `[start, end)`, in region-id order.
///
pub fn overlapping(index: &ResolutionIndex, chromosome: &str, start: i64, end: i64) -> Vec<String> {
    index
        .regions
        .values()
        .filter(|r| r.overlaps(chromosome, start, end))
        .map(|r| r.id.clone())
        .collect()
}

///
/// Region ids of one chromosome sorted by start. Equal starts are ordered
/// by region id.
///
pub fn ordered(index: &ResolutionIndex, key: &RegionOrderKey) -> Result<Vec<String>> {
    let chromosome = match key {
        RegionOrderKey::Chromosome(c) => c.as_str(),
        RegionOrderKey::Region(r) => index.region(r)?.chromosome.as_str(),
    };

    // BTreeMap values are already in id order, a stable sort keeps it for ties
    let mut regions: Vec<_> = index
        .regions
        .values()
        .filter(|r| r.chromosome == chromosome)
        .collect();
    if regions.is_empty() {
        return Err(ReaderError::NotFound(format!("regions for {}", key)));
    }
    regions.sort_by_key(|r| r.start);

    Ok(regions.into_iter().map(|r| r.id.clone()).collect())
}
