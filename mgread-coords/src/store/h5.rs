//! HDF5 adapter.
//!
//! Reads containers laid out by h5py: groups for partitions, integer
//! datasets, and scalar attributes that are integers, floats or strings
//! (variable-length or fixed-length).

use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, Dataset, File, Group, Location};
use ndarray::{Array2, Array3, Ix3};
use tracing::debug;

use mgread_core::{ReaderError, Result};

use super::memory::{MemoryStore, NodeData};
use super::{AttrValue, Attributes, CoordStore, normalize};

/// Longest fixed-length string attribute that is read back.
const MAX_FIXED_STRING: usize = 1024;

///
/// Read-only handle on an HDF5 file. The file is closed when the store is
/// dropped.
///
pub struct Hdf5Store {
    file: File,
}

impl Hdf5Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ReaderError::BackingStore(format!("cannot open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened HDF5 store");
        Ok(Hdf5Store { file })
    }

    fn group(&self, path: &str) -> Result<Group> {
        let path = normalize(path);
        match path.is_empty() {
            true => self.file.as_group().map_err(ReaderError::backing_store),
            false => self.file.group(path).map_err(ReaderError::backing_store),
        }
    }

    fn dataset(&self, path: &str) -> Result<Dataset> {
        self.file
            .dataset(normalize(path))
            .map_err(ReaderError::backing_store)
    }
}

fn read_attrs(location: &Location) -> Result<Attributes> {
    let names = location.attr_names().map_err(ReaderError::backing_store)?;

    let mut attrs = Attributes::new();
    for name in names {
        let attr = location.attr(&name).map_err(ReaderError::backing_store)?;
        // non-scalar attributes are not part of the layout, skip them
        if !attr.is_scalar() {
            continue;
        }
        attrs.insert(name, read_attr(&attr)?);
    }
    Ok(attrs)
}

fn read_attr(attr: &Attribute) -> Result<AttrValue> {
    let descriptor = attr
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(ReaderError::backing_store)?;

    let value = match descriptor {
        TypeDescriptor::Integer(_) => AttrValue::Int(
            attr.read_scalar::<i64>()
                .map_err(ReaderError::backing_store)?,
        ),
        TypeDescriptor::Unsigned(_) => AttrValue::Int(
            attr.read_scalar::<u64>()
                .map_err(ReaderError::backing_store)? as i64,
        ),
        TypeDescriptor::Float(_) => AttrValue::Float(
            attr.read_scalar::<f64>()
                .map_err(ReaderError::backing_store)?,
        ),
        TypeDescriptor::VarLenUnicode => AttrValue::Text(
            attr.read_scalar::<VarLenUnicode>()
                .map_err(ReaderError::backing_store)?
                .as_str()
                .to_string(),
        ),
        TypeDescriptor::VarLenAscii => AttrValue::Text(
            attr.read_scalar::<VarLenAscii>()
                .map_err(ReaderError::backing_store)?
                .as_str()
                .to_string(),
        ),
        TypeDescriptor::FixedAscii(_) => AttrValue::Text(
            attr.read_scalar::<FixedAscii<MAX_FIXED_STRING>>()
                .map_err(ReaderError::backing_store)?
                .as_str()
                .to_string(),
        ),
        TypeDescriptor::FixedUnicode(_) => AttrValue::Text(
            attr.read_scalar::<FixedUnicode<MAX_FIXED_STRING>>()
                .map_err(ReaderError::backing_store)?
                .as_str()
                .to_string(),
        ),
        other => {
            return Err(ReaderError::BackingStore(format!(
                "unsupported attribute type {:?}",
                other
            )));
        }
    };
    Ok(value)
}

impl CoordStore for Hdf5Store {
    fn list_groups(&self, path: &str) -> Result<Vec<String>> {
        self.group(path)?
            .member_names()
            .map_err(ReaderError::backing_store)
    }

    fn has_group(&self, path: &str) -> Result<bool> {
        // walk the path so a missing intermediate link is a plain `false`
        let mut current = String::new();
        for part in normalize(path).split('/').filter(|p| !p.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            if !self.file.link_exists(&current) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn attributes(&self, path: &str) -> Result<Attributes> {
        match self.file.dataset(normalize(path)) {
            Ok(ds) => read_attrs(&ds),
            Err(_) => read_attrs(&self.group(path)?),
        }
    }

    fn shape(&self, path: &str) -> Result<Vec<usize>> {
        Ok(self.dataset(path)?.shape())
    }

    fn read_table(&self, path: &str) -> Result<Array2<i64>> {
        let ds = self.dataset(path)?;
        let shape = ds.shape();
        if shape.len() != 2 {
            return Err(ReaderError::BackingStore(format!(
                "'{}' has {} dimensions, expected 2",
                path,
                shape.len()
            )));
        }
        let values = ds.read_raw::<i64>().map_err(ReaderError::backing_store)?;
        Array2::from_shape_vec((shape[0], shape[1]), values).map_err(ReaderError::backing_store)
    }

    fn read_ids(&self, path: &str) -> Result<Vec<i64>> {
        self.dataset(path)?
            .read_raw::<i64>()
            .map_err(ReaderError::backing_store)
    }

    fn read_slice(&self, path: &str, rows: Range<usize>) -> Result<Array3<i32>> {
        let ds = self.dataset(path)?;
        let shape = ds.shape();
        if shape.len() != 3 || rows.start > rows.end || rows.end > shape[0] {
            return Err(ReaderError::BackingStore(format!(
                "cannot read rows {:?} of '{}' with shape {:?}",
                rows, path, shape
            )));
        }
        ds.read_slice::<i32, _, Ix3>((rows, .., ..))
            .map_err(ReaderError::backing_store)
    }
}

///
/// Write a [`MemoryStore`] out as an HDF5 file with the same layout, so
/// generated fixtures can be opened by any HDF5 tool.
///
pub fn export_hdf5<P: AsRef<Path>>(store: &MemoryStore, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(ReaderError::backing_store)?;

    for (name, node) in store.nodes() {
        if name.is_empty() {
            continue;
        }
        match &node.data {
            NodeData::Group => {
                let group = file
                    .create_group(name)
                    .map_err(ReaderError::backing_store)?;
                write_attrs(&group, &node.attrs)?;
            }
            NodeData::Int32 { shape, values } => {
                let ds = file
                    .new_dataset::<i32>()
                    .shape(shape.clone())
                    .create(name.as_str())
                    .map_err(ReaderError::backing_store)?;
                ds.write_raw(values.as_slice())
                    .map_err(ReaderError::backing_store)?;
                write_attrs(&ds, &node.attrs)?;
            }
            NodeData::Int64 { shape, values } => {
                let ds = file
                    .new_dataset::<i64>()
                    .shape(shape.clone())
                    .create(name.as_str())
                    .map_err(ReaderError::backing_store)?;
                ds.write_raw(values.as_slice())
                    .map_err(ReaderError::backing_store)?;
                write_attrs(&ds, &node.attrs)?;
            }
        }
    }

    debug!(path = %path.display(), "Exported store to HDF5");
    Ok(())
}

fn write_attrs(location: &Location, attrs: &Attributes) -> Result<()> {
    for (name, value) in attrs {
        write_attr(location, name, value)?;
    }
    Ok(())
}

fn write_attr(location: &Location, name: &str, value: &AttrValue) -> Result<()> {
    match value {
        AttrValue::Int(v) => location
            .new_attr::<i64>()
            .shape(())
            .create(name)
            .and_then(|attr| attr.write_scalar(v)),
        AttrValue::Float(v) => location
            .new_attr::<f64>()
            .shape(())
            .create(name)
            .and_then(|attr| attr.write_scalar(v)),
        AttrValue::Text(s) => {
            let text = VarLenUnicode::from_str(s).map_err(ReaderError::backing_store)?;
            location
                .new_attr::<VarLenUnicode>()
                .shape(())
                .create(name)
                .and_then(|attr| attr.write_scalar(&text))
        }
    }
    .map_err(ReaderError::backing_store)
}
