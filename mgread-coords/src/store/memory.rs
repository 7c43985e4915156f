//! In-memory store.
//!
//! [`MemoryStore`] holds the same group/dataset/attribute tree as an HDF5
//! container. It backs generated fixtures and tests, and is persisted as a
//! `.coords` snapshot that [`SnapshotStore`](super::SnapshotStore) reads
//! back row range by row range.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use ndarray::{Array2, Array3, s};

use mgread_core::{ReaderError, Result};

use super::snapshot::write_snapshot;
use super::{AttrValue, Attributes, CoordStore, normalize};

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Group,
    Int32 { shape: Vec<usize>, values: Vec<i32> },
    Int64 { shape: Vec<usize>, values: Vec<i64> },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) attrs: Attributes,
    pub(crate) data: NodeData,
}

impl Node {
    fn group() -> Self {
        Node {
            attrs: Attributes::new(),
            data: NodeData::Group,
        }
    }

    fn shape(&self) -> Option<&[usize]> {
        match &self.data {
            NodeData::Group => None,
            NodeData::Int32 { shape, .. } | NodeData::Int64 { shape, .. } => Some(shape),
        }
    }

    fn values_i64(&self) -> Option<Vec<i64>> {
        match &self.data {
            NodeData::Group => None,
            NodeData::Int32 { values, .. } => Some(values.iter().map(|v| *v as i64).collect()),
            NodeData::Int64 { values, .. } => Some(values.clone()),
        }
    }
}

///
/// A hierarchical array container held in memory.
///
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<String, Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), Node::group());
        MemoryStore { nodes }
    }

    ///
    /// Create a group and any missing parents.
    ///
    pub fn create_group(&mut self, path: &str) {
        let path = normalize(path);
        let mut current = String::new();
        self.nodes.entry(String::new()).or_insert_with(Node::group);
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            self.nodes.entry(current.clone()).or_insert_with(Node::group);
        }
    }

    fn insert_dataset(&mut self, path: &str, data: NodeData) -> Result<()> {
        let path = normalize(path);
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.create_group(parent);
        }
        let expected: usize = match &data {
            NodeData::Int32 { shape, .. } | NodeData::Int64 { shape, .. } => shape.iter().product(),
            NodeData::Group => 0,
        };
        let found = match &data {
            NodeData::Int32 { values, .. } => values.len(),
            NodeData::Int64 { values, .. } => values.len(),
            NodeData::Group => 0,
        };
        if expected != found {
            return Err(ReaderError::InvalidArgument(format!(
                "dataset {} has {} values for a shape of {} elements",
                path, found, expected
            )));
        }

        let attrs = self
            .nodes
            .remove(path)
            .map(|n| n.attrs)
            .unwrap_or_default();
        self.nodes.insert(path.to_string(), Node { attrs, data });
        Ok(())
    }

    ///
    /// Insert an `i32` dataset stored row-major with the given shape.
    ///
    pub fn insert_i32(&mut self, path: &str, shape: Vec<usize>, values: Vec<i32>) -> Result<()> {
        self.insert_dataset(path, NodeData::Int32 { shape, values })
    }

    ///
    /// Insert an `i64` dataset stored row-major with the given shape.
    ///
    pub fn insert_i64(&mut self, path: &str, shape: Vec<usize>, values: Vec<i64>) -> Result<()> {
        self.insert_dataset(path, NodeData::Int64 { shape, values })
    }

    ///
    /// Attach an attribute to an existing group or dataset.
    ///
    pub fn set_attr<V: Into<AttrValue>>(&mut self, path: &str, name: &str, value: V) -> Result<()> {
        let node = self
            .nodes
            .get_mut(normalize(path))
            .ok_or_else(|| ReaderError::NotFound(format!("object {}", path)))?;
        node.attrs.insert(name.to_string(), value.into());
        Ok(())
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.nodes.iter()
    }

    fn node(&self, path: &str) -> Result<&Node> {
        self.nodes
            .get(normalize(path))
            .ok_or_else(|| ReaderError::BackingStore(format!("no object at '{}'", path)))
    }

    ///
    /// Write the store as a `.coords` snapshot.
    ///
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_snapshot(self, path.as_ref())
    }
}

/// Names of the direct children of `path` in a tree keyed by full path.
pub(super) fn child_names<V>(nodes: &BTreeMap<String, V>, path: &str) -> Vec<String> {
    let prefix = match path.is_empty() {
        true => String::new(),
        false => format!("{}/", path),
    };
    nodes
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter_map(|(k, _)| {
            let rest = &k[prefix.len()..];
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        })
        .collect()
}

impl CoordStore for MemoryStore {
    fn list_groups(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path);
        let node = self.node(path)?;
        if !matches!(node.data, NodeData::Group) {
            return Err(ReaderError::BackingStore(format!("'{}' is not a group", path)));
        }

        Ok(child_names(&self.nodes, path))
    }

    fn has_group(&self, path: &str) -> Result<bool> {
        Ok(self.nodes.contains_key(normalize(path)))
    }

    fn attributes(&self, path: &str) -> Result<Attributes> {
        Ok(self.node(path)?.attrs.clone())
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        self.node(path)?
            .shape()
            .map(<[usize]>::to_vec)
            .ok_or_else(|| ReaderError::BackingStore(format!("'{}' is not a dataset", path)))
    }

    fn read_table(&self, path: &str) -> Result<Array2<i64>> {
        let node = self.node(path)?;
        let shape = self.shape(path)?;
        if shape.len() != 2 {
            return Err(ReaderError::BackingStore(format!(
                "'{}' has {} dimensions, expected 2",
                path,
                shape.len()
            )));
        }
        let values = node.values_i64().unwrap_or_default();
        Array2::from_shape_vec((shape[0], shape[1]), values).map_err(ReaderError::backing_store)
    }

    fn read_ids(&self, path: &str) -> Result<Vec<i64>> {
        let node = self.node(path)?;
        let shape = self.shape(path)?;
        if shape.len() != 1 {
            return Err(ReaderError::BackingStore(format!(
                "'{}' has {} dimensions, expected 1",
                path,
                shape.len()
            )));
        }
        Ok(node.values_i64().unwrap_or_default())
    }

    fn read_slice(&self, path: &str, rows: Range<usize>) -> Result<Array3<i32>> {
        let node = self.node(path)?;
        let (shape, values) = match &node.data {
            NodeData::Int32 { shape, values } if shape.len() == 3 => (shape, values),
            _ => {
                return Err(ReaderError::BackingStore(format!(
                    "'{}' is not a 3D int32 array",
                    path
                )));
            }
        };
        if rows.start > rows.end || rows.end > shape[0] {
            return Err(ReaderError::BackingStore(format!(
                "rows {:?} out of bounds for '{}' with {} rows",
                rows, path, shape[0]
            )));
        }

        let view = ndarray::ArrayView3::from_shape((shape[0], shape[1], shape[2]), values)
            .map_err(ReaderError::backing_store)?;
        Ok(view.slice(s![rows, .., ..]).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotStore;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create_group("1000/meta/model_params");
        store
            .insert_i32("1000/data", vec![4, 2, 3], (0..24).collect())
            .unwrap();
        store
            .insert_i64("1000/meta/model_params/r1", vec![2, 2], vec![0, 3, 1, 4])
            .unwrap();
        store.set_attr("1000/meta/model_params/r1", "i", 1i64).unwrap();
        store
            .set_attr("1000/meta/model_params/r1", "chromosome", "chr2")
            .unwrap();
        store
    }

    #[rstest]
    fn test_list_groups(store: MemoryStore) {
        assert_eq!(store.list_groups("").unwrap(), vec!["1000"]);
        assert_eq!(store.list_groups("/1000").unwrap(), vec!["data", "meta"]);
        assert_eq!(
            store.list_groups("1000/meta/model_params").unwrap(),
            vec!["r1"]
        );
        assert!(store.list_groups("1000/data").is_err());
    }

    #[rstest]
    fn test_has_group(store: MemoryStore) {
        assert!(store.has_group("1000").unwrap());
        assert!(store.has_group("1000/meta/model_params/r1").unwrap());
        assert!(!store.has_group("5000").unwrap());
    }

    #[rstest]
    fn test_attributes(store: MemoryStore) {
        let attrs = store.attributes("1000/meta/model_params/r1").unwrap();
        assert_eq!(attrs.get("i"), Some(&AttrValue::Int(1)));
        assert_eq!(attrs.get("chromosome").and_then(|a| a.as_text()), Some("chr2"));
    }

    #[rstest]
    fn test_read_table(store: MemoryStore) {
        let table = store.read_table("1000/meta/model_params/r1").unwrap();
        assert_eq!(table.shape(), &[2, 2]);
        assert_eq!(table[[1, 0]], 1);
        assert_eq!(table[[1, 1]], 4);
    }

    #[rstest]
    fn test_read_slice(store: MemoryStore) {
        let block = store.read_slice("1000/data", 1..3).unwrap();
        assert_eq!(block.shape(), &[2, 2, 3]);
        assert_eq!(block[[0, 0, 0]], 6);
        assert_eq!(block[[1, 1, 2]], 17);
        assert!(store.read_slice("1000/data", 3..5).is_err());
    }

    #[rstest]
    fn test_shape_mismatch_rejected() {
        let mut store = MemoryStore::new();
        let result = store.insert_i32("data", vec![2, 2, 3], vec![0; 5]);
        assert!(matches!(result, Err(ReaderError::InvalidArgument(_))));
    }

    #[rstest]
    fn test_snapshot_keeps_layout(store: MemoryStore) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("nested/store.coords");
        store.save(&path).unwrap();

        let loaded = SnapshotStore::open(&path).unwrap();
        assert_eq!(loaded.list_groups("1000").unwrap(), vec!["data", "meta"]);
        assert_eq!(
            loaded.read_slice("1000/data", 0..4).unwrap(),
            store.read_slice("1000/data", 0..4).unwrap()
        );
    }
}
