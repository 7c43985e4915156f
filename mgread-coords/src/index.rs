//! Per-resolution index.
//!
//! Binding a resolution reads the descriptive attributes of `<res>/data`
//! and the attributes of every `<res>/meta/model_params/<region>` table
//! once, validates them, and keeps the result for the life of the binding.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use mgread_core::{ReaderError, Result};

use crate::regions::RegionEntry;
use crate::store::{AttrValue, Attributes, CoordStore};

/// Descriptive attributes every `<res>/data` array must carry.
pub const DESCRIPTIVE_ATTRS: [&str; 11] = [
    "title",
    "experimentType",
    "species",
    "project",
    "identifier",
    "assembly",
    "cellType",
    "resolution",
    "datatype",
    "components",
    "source",
];

/// Number of spatial coordinates per position.
pub const COORD_DIMS: usize = 3;

pub fn data_path(resolution: u32) -> String {
    format!("{}/data", resolution)
}

pub fn model_params_path(resolution: u32) -> String {
    format!("{}/meta/model_params", resolution)
}

pub fn region_params_path(resolution: u32, region: &str) -> String {
    format!("{}/meta/model_params/{}", resolution, region)
}

pub fn clusters_path(resolution: u32, region: &str) -> String {
    format!("{}/meta/clusters/{}", resolution, region)
}

pub fn centroids_path(resolution: u32, region: &str) -> String {
    format!("{}/meta/centroids/{}", resolution, region)
}

///
/// Resolution-wide descriptive attributes of the coordinate array.
///
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetHeader {
    /// `title`, `experimentType`, ... keyed by their attribute names
    pub descriptive: BTreeMap<String, String>,
    pub dependencies: Value,
    pub tadbit_meta: Value,
    pub hic_data: Value,
    pub restraints: Value,
}

impl DatasetHeader {
    ///
    /// Build the header from the attributes of `<res>/data`.
    ///
    /// Numbers are accepted for descriptive attributes and rendered as text.
    /// The JSON attributes are optional and default to `[]` (dependencies,
    /// restraints) or `{}` (TADbit_meta, hic_data).
    ///
    pub fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let mut descriptive = BTreeMap::new();
        for name in DESCRIPTIVE_ATTRS {
            let value = attrs.get(name).ok_or_else(|| {
                ReaderError::Schema(format!("data array is missing the '{}' attribute", name))
            })?;
            descriptive.insert(name.to_string(), value.to_string());
        }

        Ok(DatasetHeader {
            descriptive,
            dependencies: json_attr(attrs, "dependencies", Value::Array(vec![]))?,
            tadbit_meta: json_attr(attrs, "TADbit_meta", Value::Object(Default::default()))?,
            hic_data: json_attr(attrs, "hic_data", Value::Object(Default::default()))?,
            restraints: json_attr(attrs, "restraints", Value::Array(vec![]))?,
        })
    }

    pub fn get(&self, name: &str) -> &str {
        self.descriptive.get(name).map(String::as_str).unwrap_or("")
    }
}

fn json_attr(attrs: &Attributes, name: &str, default: Value) -> Result<Value> {
    match attrs.get(name) {
        None => Ok(default),
        Some(AttrValue::Text(raw)) => serde_json::from_str(raw).map_err(|e| {
            ReaderError::Schema(format!("attribute '{}' is not valid JSON: {}", name, e))
        }),
        Some(other) => Err(ReaderError::Schema(format!(
            "attribute '{}' must be a JSON string, found {}",
            name, other
        ))),
    }
}

fn int_attr(attrs: &Attributes, region: &str, name: &str) -> Result<i64> {
    attrs.get(name).and_then(AttrValue::as_int).ok_or_else(|| {
        ReaderError::Schema(format!(
            "region '{}' needs an integer '{}' attribute",
            region, name
        ))
    })
}

fn row_attr(attrs: &Attributes, region: &str, name: &str) -> Result<usize> {
    let value = int_attr(attrs, region, name)?;
    usize::try_from(value).map_err(|_| {
        ReaderError::Schema(format!(
            "region '{}' has a negative row bound {}={}",
            region, name, value
        ))
    })
}

///
/// Everything known about one bound resolution.
///
#[derive(Debug, Clone)]
pub struct ResolutionIndex {
    pub resolution: u32,
    pub header: DatasetHeader,
    /// Rows of the coordinate array
    pub rows: usize,
    /// Model columns of the coordinate array
    pub columns: usize,
    /// Regions keyed by identifier
    pub regions: BTreeMap<String, RegionEntry>,
}

impl ResolutionIndex {
    ///
    /// Read and validate the index of `resolution`.
    ///
    /// # Arguments
    /// - store: the opened backing store
    /// - resolution: resolution key, must be a top-level group
    pub fn load(store: &dyn CoordStore, resolution: u32) -> Result<Self> {
        if !store.has_group(&resolution.to_string())? {
            return Err(ReaderError::NotFound(format!("resolution {}", resolution)));
        }

        let data = data_path(resolution);
        let shape = store.shape(&data)?;
        if shape.len() != 3 || shape[2] != COORD_DIMS {
            return Err(ReaderError::Schema(format!(
                "'{}' must have shape [rows, models, 3], found {:?}",
                data, shape
            )));
        }
        let (rows, columns) = (shape[0], shape[1]);

        let header = DatasetHeader::from_attributes(&store.attributes(&data)?)?;

        let mut regions = BTreeMap::new();
        for region in store.list_groups(&model_params_path(resolution))? {
            let table = region_params_path(resolution, &region);
            check_model_table(&region, &store.shape(&table)?, columns)?;
            let attrs = store.attributes(&table)?;
            let entry = RegionEntry {
                chromosome: attrs
                    .get("chromosome")
                    .and_then(AttrValue::as_text)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ReaderError::Schema(format!(
                            "region '{}' needs a text 'chromosome' attribute",
                            region
                        ))
                    })?,
                start: int_attr(&attrs, &region, "start")?,
                end: int_attr(&attrs, &region, "end")?,
                i: row_attr(&attrs, &region, "i")?,
                j: row_attr(&attrs, &region, "j")?,
                id: region.clone(),
            };
            if entry.i > entry.j || entry.j > rows {
                return Err(ReaderError::Schema(format!(
                    "region '{}' rows [{}, {}) fall outside the {} rows of '{}'",
                    region, entry.i, entry.j, rows, data
                )));
            }
            regions.insert(region, entry);
        }

        check_disjoint(&regions)?;

        debug!(
            resolution,
            rows,
            columns,
            regions = regions.len(),
            "Loaded resolution index"
        );

        Ok(ResolutionIndex {
            resolution,
            header,
            rows,
            columns,
            regions,
        })
    }

    pub fn region(&self, region: &str) -> Result<&RegionEntry> {
        self.regions
            .get(region)
            .ok_or_else(|| ReaderError::NotFound(format!("region {}", region)))
    }
}

/// A model table is `[models, 2+]` and never lists more models than the
/// array has columns.
fn check_model_table(region: &str, shape: &[usize], columns: usize) -> Result<()> {
    match shape {
        [models, width] if *width >= 2 && *models <= columns => Ok(()),
        [models, width] if *width >= 2 => Err(ReaderError::Schema(format!(
            "model table of region '{}' lists {} models but the data array has {} model columns",
            region, models, columns
        ))),
        _ => Err(ReaderError::Schema(format!(
            "model table of region '{}' must have shape [models, 2], found {:?}",
            region, shape
        ))),
    }
}

fn check_disjoint(regions: &BTreeMap<String, RegionEntry>) -> Result<()> {
    let mut spans: Vec<&RegionEntry> = regions.values().filter(|r| r.i < r.j).collect();
    spans.sort_by_key(|r| r.i);
    for pair in spans.windows(2) {
        if pair[1].i < pair[0].j {
            return Err(ReaderError::Schema(format!(
                "regions '{}' and '{}' share rows of the coordinate array",
                pair[0].id, pair[1].id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn add_region(store: &mut MemoryStore, id: &str, chrom: &str, rows: (i64, i64)) {
        let path = region_params_path(1000, id);
        store.insert_i64(&path, vec![1, 2], vec![0, 0]).unwrap();
        store.set_attr(&path, "chromosome", chrom).unwrap();
        store.set_attr(&path, "start", 100i64).unwrap();
        store.set_attr(&path, "end", 200i64).unwrap();
        store.set_attr(&path, "i", rows.0).unwrap();
        store.set_attr(&path, "j", rows.1).unwrap();
    }

    #[fixture]
    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert_i32(&data_path(1000), vec![6, 1, 3], vec![0; 18])
            .unwrap();
        for name in DESCRIPTIVE_ATTRS {
            store.set_attr(&data_path(1000), name, name).unwrap();
        }
        add_region(&mut store, "a", "chr1", (0, 2));
        add_region(&mut store, "b", "chr2", (2, 6));
        store
    }

    #[rstest]
    fn test_load_index(store: MemoryStore) {
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        assert_eq!(index.rows, 6);
        assert_eq!(index.columns, 1);
        assert_eq!(index.regions.len(), 2);
        assert_eq!(index.region("b").unwrap().i, 2);
        assert_eq!(index.header.get("cellType"), "cellType");
        assert_eq!(index.header.dependencies, Value::Array(vec![]));
        assert_eq!(index.header.hic_data, serde_json::json!({}));
    }

    #[rstest]
    fn test_unknown_resolution(store: MemoryStore) {
        let result = ResolutionIndex::load(&store, 5000);
        assert!(matches!(result, Err(ReaderError::NotFound(_))));
    }

    #[rstest]
    fn test_missing_descriptive_attribute() {
        let mut store = MemoryStore::new();
        store
            .insert_i32(&data_path(1000), vec![1, 1, 3], vec![0; 3])
            .unwrap();
        store.set_attr(&data_path(1000), "title", "t").unwrap();
        let result = ResolutionIndex::load(&store, 1000);
        assert!(matches!(result, Err(ReaderError::Schema(_))));
    }

    #[rstest]
    fn test_malformed_json_attribute(mut store: MemoryStore) {
        store
            .set_attr(&data_path(1000), "TADbit_meta", "{not json")
            .unwrap();
        let result = ResolutionIndex::load(&store, 1000);
        assert!(matches!(result, Err(ReaderError::Schema(_))));
    }

    #[rstest]
    fn test_overlapping_rows_rejected(mut store: MemoryStore) {
        add_region(&mut store, "c", "chr3", (1, 3));
        let result = ResolutionIndex::load(&store, 1000);
        assert!(matches!(result, Err(ReaderError::Schema(_))));
    }

    #[rstest]
    fn test_rows_past_end_rejected(mut store: MemoryStore) {
        add_region(&mut store, "c", "chr3", (6, 9));
        let result = ResolutionIndex::load(&store, 1000);
        assert!(matches!(result, Err(ReaderError::Schema(_))));
    }

    #[rstest]
    fn test_model_table_longer_than_model_axis(mut store: MemoryStore) {
        let path = region_params_path(1000, "b");
        store
            .insert_i64(&path, vec![2, 2], vec![0, 0, 1, 1])
            .unwrap();
        let result = ResolutionIndex::load(&store, 1000);
        assert!(matches!(result, Err(ReaderError::Schema(_))));
    }

    #[rstest]
    fn test_model_table_needs_two_columns(mut store: MemoryStore) {
        let path = region_params_path(1000, "a");
        store.insert_i64(&path, vec![1, 1], vec![0]).unwrap();
        let result = ResolutionIndex::load(&store, 1000);
        assert!(matches!(result, Err(ReaderError::Schema(_))));
    }

    #[rstest]
    fn test_numeric_descriptive_attribute(mut store: MemoryStore) {
        store.set_attr(&data_path(1000), "resolution", 1000i64).unwrap();
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        assert_eq!(index.header.get("resolution"), "1000");
    }
}
