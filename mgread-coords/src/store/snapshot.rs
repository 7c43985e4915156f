//! File-backed snapshot store (`.coords`).
//!
//! A snapshot starts with a magic tag, a format version and the length of
//! the bincode-encoded object tree. The tree (groups, attributes and the
//! small `i64` tables) follows, then every `i32` array as little-endian
//! values. Opening a snapshot reads the tree only; array rows are read from
//! disk on request.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mgread_core::{ReaderError, Result};

use super::memory::{MemoryStore, NodeData, child_names};
use super::{Attributes, CoordStore, normalize};

const MAGIC: &[u8; 4] = b"MGRD";
const FORMAT_VERSION: u8 = 1;

/// magic, version and tree length
const PREAMBLE_LEN: u64 = 4 + 1 + 8;

const VALUE_LEN: u64 = std::mem::size_of::<i32>() as u64;

#[derive(Debug, Serialize, Deserialize)]
enum Entry {
    Group,
    Int64 { shape: Vec<usize>, values: Vec<i64> },
    /// `offset` counts values from the start of the array section
    Int32 { shape: Vec<usize>, offset: u64 },
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotNode {
    attrs: Attributes,
    entry: Entry,
}

impl SnapshotNode {
    fn shape(&self) -> Option<&[usize]> {
        match &self.entry {
            Entry::Group => None,
            Entry::Int64 { shape, .. } | Entry::Int32 { shape, .. } => Some(shape),
        }
    }
}

///
/// Write `store` as a snapshot at `path`, creating parent directories.
///
pub(crate) fn write_snapshot(store: &MemoryStore, path: &Path) -> Result<()> {
    let mut offset = 0u64;
    let mut tree = BTreeMap::new();
    for (name, node) in store.nodes() {
        let entry = match &node.data {
            NodeData::Group => Entry::Group,
            NodeData::Int64 { shape, values } => Entry::Int64 {
                shape: shape.clone(),
                values: values.clone(),
            },
            NodeData::Int32 { shape, values } => {
                let entry = Entry::Int32 {
                    shape: shape.clone(),
                    offset,
                };
                offset += values.len() as u64;
                entry
            }
        };
        let attrs = node.attrs.clone();
        tree.insert(name.clone(), SnapshotNode { attrs, entry });
    }
    let encoded = bincode::serialize(&tree).map_err(ReaderError::backing_store)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(MAGIC)?;
    writer.write_u8(FORMAT_VERSION)?;
    writer.write_u64::<LittleEndian>(encoded.len() as u64)?;
    writer.write_all(&encoded)?;

    // same order as the offsets above
    for (_, node) in store.nodes() {
        if let NodeData::Int32 { values, .. } = &node.data {
            for value in values {
                writer.write_i32::<LittleEndian>(*value)?;
            }
        }
    }
    writer.flush()?;

    debug!(
        path = %path.display(),
        objects = tree.len(),
        values = offset,
        "Saved store snapshot"
    );
    Ok(())
}

///
/// A snapshot opened from disk. Only the object tree is held in memory.
///
#[derive(Debug)]
pub struct SnapshotStore {
    file: File,
    tree: BTreeMap<String, SnapshotNode>,
    data_start: u64,
}

impl SnapshotStore {
    ///
    /// Open a snapshot written by [`MemoryStore::save`].
    ///
    /// The header and the file length are checked here, array values are
    /// not read.
    ///
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        let invalid =
            |what: String| ReaderError::BackingStore(format!("{}: {}", path.display(), what));

        let (tree, data_start) = {
            let mut reader = BufReader::new(&file);
            let mut magic = [0u8; 4];
            reader.read_exact(&mut magic)?;
            let version = reader.read_u8()?;
            if &magic != MAGIC || version != FORMAT_VERSION {
                return Err(invalid(format!(
                    "not a version {} store snapshot",
                    FORMAT_VERSION
                )));
            }

            let tree_len = reader.read_u64::<LittleEndian>()?;
            if PREAMBLE_LEN + tree_len > file_len {
                return Err(invalid("truncated object tree".to_string()));
            }
            let mut encoded = vec![0u8; tree_len as usize];
            reader.read_exact(&mut encoded)?;
            let tree: BTreeMap<String, SnapshotNode> = bincode::deserialize(&encoded)
                .map_err(|e| invalid(format!("cannot decode object tree: {}", e)))?;
            (tree, PREAMBLE_LEN + tree_len)
        };

        let values: u64 = tree
            .values()
            .filter_map(|node| match &node.entry {
                Entry::Int32 { shape, offset } => {
                    Some(offset + shape.iter().product::<usize>() as u64)
                }
                _ => None,
            })
            .max()
            .unwrap_or(0);
        if data_start + values * VALUE_LEN > file_len {
            return Err(invalid(format!(
                "array section holds fewer than {} values",
                values
            )));
        }

        debug!(path = %path.display(), objects = tree.len(), "Opened store snapshot");
        Ok(SnapshotStore {
            file,
            tree,
            data_start,
        })
    }

    fn node(&self, path: &str) -> Result<&SnapshotNode> {
        self.tree
            .get(normalize(path))
            .ok_or_else(|| ReaderError::BackingStore(format!("no object at '{}'", path)))
    }

    /// `count` values starting `first` values into the array section.
    fn read_values(&self, first: u64, count: usize) -> Result<Vec<i32>> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(self.data_start + first * VALUE_LEN))?;
        let mut values = vec![0i32; count];
        BufReader::new(file).read_i32_into::<LittleEndian>(&mut values)?;
        Ok(values)
    }

    fn read_all(&self, path: &str, dims: usize) -> Result<Vec<i64>> {
        let node = self.node(path)?;
        let shape = node
            .shape()
            .ok_or_else(|| ReaderError::BackingStore(format!("'{}' is not a dataset", path)))?;
        if shape.len() != dims {
            return Err(ReaderError::BackingStore(format!(
                "'{}' has {} dimensions, expected {}",
                path,
                shape.len(),
                dims
            )));
        }
        match &node.entry {
            Entry::Int64 { values, .. } => Ok(values.clone()),
            Entry::Int32 { shape, offset } => Ok(self
                .read_values(*offset, shape.iter().product())?
                .into_iter()
                .map(i64::from)
                .collect()),
            Entry::Group => Ok(vec![]),
        }
    }
}

impl CoordStore for SnapshotStore {
    fn list_groups(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path);
        if !matches!(self.node(path)?.entry, Entry::Group) {
            return Err(ReaderError::BackingStore(format!("'{}' is not a group", path)));
        }
        Ok(child_names(&self.tree, path))
    }

    fn has_group(&self, path: &str) -> Result<bool> {
        Ok(self.tree.contains_key(normalize(path)))
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
        let values = self.read_all(path, 2)?;
        let shape = self.shape(path)?;
        Array2::from_shape_vec((shape[0], shape[1]), values).map_err(ReaderError::backing_store)
    }

    fn read_ids(&self, path: &str) -> Result<Vec<i64>> {
        self.read_all(path, 1)
    }

    fn read_slice(&self, path: &str, rows: Range<usize>) -> Result<Array3<i32>> {
        let (shape, offset) = match &self.node(path)?.entry {
            Entry::Int32 { shape, offset } if shape.len() == 3 => (shape, *offset),
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

        let row_len = shape[1] * shape[2];
        let first = offset + (rows.start * row_len) as u64;
        let values = self.read_values(first, rows.len() * row_len)?;
        Array3::from_shape_vec((rows.len(), shape[1], shape[2]), values)
            .map_err(ReaderError::backing_store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::OpenOptions;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::TempDir;

    #[fixture]
    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert_i32("1000/data", vec![4, 2, 3], (0..24).collect())
            .unwrap();
        store
            .insert_i32("5000/data", vec![1, 1, 3], vec![7, 8, 9])
            .unwrap();
        store
            .insert_i64("1000/meta/model_params/r1", vec![2, 2], vec![0, 3, 1, 4])
            .unwrap();
        store
            .insert_i64("1000/meta/centroids/r1", vec![1], vec![3])
            .unwrap();
        store
            .set_attr("1000/meta/model_params/r1", "chromosome", "chr2")
            .unwrap();
        store
    }

    fn saved(store: &MemoryStore) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/store.coords");
        store.save(&path).unwrap();
        (dir, path)
    }

    #[rstest]
    fn test_snapshot_matches_memory(store: MemoryStore) {
        let (_dir, path) = saved(&store);
        let snapshot = SnapshotStore::open(&path).unwrap();

        assert_eq!(snapshot.list_groups("").unwrap(), vec!["1000", "5000"]);
        assert_eq!(snapshot.list_groups("1000").unwrap(), vec!["data", "meta"]);
        assert_eq!(
            snapshot.attributes("1000/meta/model_params/r1").unwrap(),
            store.attributes("1000/meta/model_params/r1").unwrap()
        );
        assert_eq!(
            snapshot.read_table("1000/meta/model_params/r1").unwrap(),
            store.read_table("1000/meta/model_params/r1").unwrap()
        );
        assert_eq!(snapshot.read_ids("1000/meta/centroids/r1").unwrap(), vec![3]);
        assert_eq!(
            snapshot.read_slice("1000/data", 1..3).unwrap(),
            store.read_slice("1000/data", 1..3).unwrap()
        );
        assert_eq!(
            snapshot.read_slice("5000/data", 0..1).unwrap(),
            store.read_slice("5000/data", 0..1).unwrap()
        );
    }

    #[rstest]
    fn test_rows_are_read_from_disk(store: MemoryStore) {
        let (_dir, path) = saved(&store);
        let snapshot = SnapshotStore::open(&path).unwrap();

        // the first array is `1000/data`, overwrite the first value of row 2
        let mut file = OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(snapshot.data_start + 12 * VALUE_LEN))
            .unwrap();
        file.write_i32::<LittleEndian>(-5).unwrap();
        file.flush().unwrap();

        let block = snapshot.read_slice("1000/data", 2..4).unwrap();
        assert_eq!(block[[0, 0, 0]], -5);
        assert_eq!(block[[1, 1, 2]], 23);
    }

    #[rstest]
    fn test_empty_row_range(store: MemoryStore) {
        let (_dir, path) = saved(&store);
        let snapshot = SnapshotStore::open(&path).unwrap();
        let block = snapshot.read_slice("1000/data", 2..2).unwrap();
        assert_eq!(block.shape(), &[0, 2, 3]);
        assert!(snapshot.read_slice("1000/data", 3..5).is_err());
    }

    #[rstest]
    fn test_truncated_snapshot_rejected(store: MemoryStore) {
        let (_dir, path) = saved(&store);
        let len = std::fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(len - 4)
            .unwrap();
        assert!(matches!(
            SnapshotStore::open(&path),
            Err(ReaderError::BackingStore(_))
        ));
    }

    #[rstest]
    fn test_foreign_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.coords");
        std::fs::write(&path, b"not a snapshot at all").unwrap();
        assert!(matches!(
            SnapshotStore::open(&path),
            Err(ReaderError::BackingStore(_))
        ));
    }
}
