//! Region header and clustering metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mgread_core::{ReaderError, Result};

use crate::index::{ResolutionIndex, centroids_path, clusters_path};
use crate::store::CoordStore;

///
/// Descriptive header of one region, as returned in the `object` field of
/// a model page.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionHeader {
    pub title: String,
    pub experiment_type: String,
    pub species: String,
    pub project: String,
    pub identifier: String,
    pub assembly: String,
    pub cell_type: String,
    pub resolution: String,
    pub datatype: String,
    pub components: String,
    pub source: String,
    pub chrom_end: Vec<i64>,
    pub end: i64,
    pub chrom_start: Vec<i64>,
    pub start: i64,
    pub chrom: String,
    pub dependencies: Value,
    pub uuid: String,
}

impl RegionHeader {
    pub fn build(index: &ResolutionIndex, region: &str) -> Result<Self> {
        let entry = index.region(region)?;
        let header = &index.header;
        let text = |name: &str| header.get(name).to_string();

        Ok(RegionHeader {
            title: text("title"),
            experiment_type: text("experimentType"),
            species: text("species"),
            project: text("project"),
            identifier: text("identifier"),
            assembly: text("assembly"),
            cell_type: text("cellType"),
            resolution: text("resolution"),
            datatype: text("datatype"),
            components: text("components"),
            source: text("source"),
            chrom_end: vec![entry.end],
            end: entry.end,
            chrom_start: vec![entry.start],
            start: entry.start,
            chrom: entry.chromosome.clone(),
            dependencies: header.dependencies.clone(),
            uuid: entry.id.clone(),
        })
    }
}

///
/// Cluster membership lists of a region, one per hierarchy level, ordered
/// by level number. A region without clusters yields an empty list.
///
pub fn clusters(store: &dyn CoordStore, index: &ResolutionIndex, region: &str) -> Result<Vec<Vec<i64>>> {
    index.region(region)?;
    let path = clusters_path(index.resolution, region);
    if !store.has_group(&path)? {
        return Ok(vec![]);
    }

    let mut levels = store
        .list_groups(&path)?
        .into_iter()
        .map(|name| {
            name.parse::<u32>().map(|level| (level, name.clone())).map_err(|_| {
                ReaderError::Schema(format!(
                    "cluster level '{}' of region '{}' is not a number",
                    name, region
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    levels.sort();

    levels
        .into_iter()
        .map(|(_, name)| store.read_ids(&format!("{}/{}", path, name)))
        .collect()
}

///
/// Centroid model ids of a region. A region without centroids yields an
/// empty list.
///
pub fn centroids(store: &dyn CoordStore, index: &ResolutionIndex, region: &str) -> Result<Vec<i64>> {
    index.region(region)?;
    let path = centroids_path(index.resolution, region);
    match store.has_group(&path)? {
        true => store.read_ids(&path),
        false => Ok(vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DESCRIPTIVE_ATTRS, data_path, region_params_path};
    use crate::store::MemoryStore;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let data = data_path(1000);
        store.insert_i32(&data, vec![2, 1, 3], vec![0; 6]).unwrap();
        for name in DESCRIPTIVE_ATTRS {
            store.set_attr(&data, name, name).unwrap();
        }
        store
            .set_attr(&data, "dependencies", r#"{"test": "test"}"#)
            .unwrap();

        for region in ["7", "8"] {
            let path = region_params_path(1000, region);
            store.insert_i64(&path, vec![1, 2], vec![0, 0]).unwrap();
            store.set_attr(&path, "chromosome", "chr3").unwrap();
            store.set_attr(&path, "start", 1500i64).unwrap();
            store.set_attr(&path, "end", 9000i64).unwrap();
            store.set_attr(&path, "i", 0i64).unwrap();
            store.set_attr(&path, "j", 0i64).unwrap();
        }

        // levels inserted out of order, "10" sorts before "2" as text
        for (level, ids) in [("10", vec![6i64]), ("0", vec![0, 1, 2]), ("2", vec![5])] {
            store
                .insert_i64(
                    &format!("{}/{}", clusters_path(1000, "7"), level),
                    vec![ids.len()],
                    ids,
                )
                .unwrap();
        }
        store
            .insert_i64(&centroids_path(1000, "7"), vec![2], vec![1, 10])
            .unwrap();
        store
    }

    #[rstest]
    fn test_region_header(store: MemoryStore) {
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        let header = RegionHeader::build(&index, "7").unwrap();
        assert_eq!(header.chrom, "chr3");
        assert_eq!(header.chrom_start, vec![1500]);
        assert_eq!(header.chrom_end, vec![9000]);
        assert_eq!(header.uuid, "7");
        assert_eq!(header.assembly, "assembly");
        assert_eq!(header.dependencies, serde_json::json!({"test": "test"}));

        let json = serde_json::to_value(&header).unwrap();
        for key in ["experimentType", "cellType", "chromStart", "chromEnd", "uuid"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }

    #[rstest]
    fn test_clusters_in_level_order(store: MemoryStore) {
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        assert_eq!(
            clusters(&store, &index, "7").unwrap(),
            vec![vec![0, 1, 2], vec![5], vec![6]]
        );
    }

    #[rstest]
    fn test_missing_metadata_is_empty(store: MemoryStore) {
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        assert!(clusters(&store, &index, "8").unwrap().is_empty());
        assert!(centroids(&store, &index, "8").unwrap().is_empty());
    }

    #[rstest]
    fn test_centroids(store: MemoryStore) {
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        assert_eq!(centroids(&store, &index, "7").unwrap(), vec![1, 10]);
    }

    #[rstest]
    fn test_unknown_region(store: MemoryStore) {
        let index = ResolutionIndex::load(&store, 1000).unwrap();
        assert!(matches!(
            RegionHeader::build(&index, "99"),
            Err(ReaderError::NotFound(_))
        ));
        assert!(matches!(
            centroids(&store, &index, "99"),
            Err(ReaderError::NotFound(_))
        ));
    }
}
