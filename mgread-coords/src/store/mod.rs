//! Backing store boundary.
//!
//! The reader never touches the container format directly. Everything goes
//! through [`CoordStore`]: group listing, attribute lookup and range-sliced
//! reads of named arrays. Paths are `/`-separated and relative to the root,
//! e.g. `1000/meta/model_params/3`.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::ops::Range;
use std::path::Path;

use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use mgread_core::utils::{FileType, get_file_type};
use mgread_core::{ReaderError, Result};

#[cfg(feature = "hdf5")]
pub mod h5;
pub mod memory;
pub mod snapshot;

#[cfg(feature = "hdf5")]
pub use self::h5::Hdf5Store;
pub use self::memory::MemoryStore;
pub use self::snapshot::SnapshotStore;

///
/// A scalar attribute value.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

pub type Attributes = BTreeMap<String, AttrValue>;

///
/// Read-only access to a hierarchical array container.
///
pub trait CoordStore {
    ///
    /// Names of the members (groups or datasets) of a group. An empty path
    /// is the root.
    ///
    fn list_groups(&self, path: &str) -> Result<Vec<String>>;

    ///
    /// Whether a group or dataset exists at `path`.
    ///
    fn has_group(&self, path: &str) -> Result<bool>;

    ///
    /// All scalar attributes attached to the object at `path`.
    ///
    fn attributes(&self, path: &str) -> Result<Attributes>;

    /// Shape of the dataset at `path`.
    fn shape(&self, path: &str) -> Result<Vec<usize>>;

    ///
    /// Read a full 2D integer table.
    ///
    fn read_table(&self, path: &str) -> Result<Array2<i64>>;

    ///
    /// Read a full 1D integer dataset.
    ///
    fn read_ids(&self, path: &str) -> Result<Vec<i64>>;

    ///
    /// Read rows `rows` of a 3D integer array, all columns and all
    /// coordinates.
    ///
    fn read_slice(&self, path: &str, rows: Range<usize>) -> Result<Array3<i32>>;
}

///
/// Open a store from disk, picking the adapter from the file extension.
///
/// # Arguments
/// - path: `.h5`/`.hdf5` (needs the `hdf5` feature) or a `.coords` snapshot
pub fn open_store<P: AsRef<Path>>(path: P) -> Result<Box<dyn CoordStore>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ReaderError::NotFound(format!(
            "store file {}",
            path.display()
        )));
    }

    match get_file_type(path) {
        FileType::Snapshot => Ok(Box::new(SnapshotStore::open(path)?)),
        #[cfg(feature = "hdf5")]
        FileType::Hdf5 => Ok(Box::new(Hdf5Store::open(path)?)),
        #[cfg(not(feature = "hdf5"))]
        FileType::Hdf5 => Err(ReaderError::BackingStore(format!(
            "HDF5 support is not enabled, cannot open {}",
            path.display()
        ))),
        _ => Err(ReaderError::BackingStore(format!(
            "unsupported store format: {}",
            path.display()
        ))),
    }
}

/// Strip leading and trailing separators so `"/1000/"` and `"1000"` agree.
pub(crate) fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}
