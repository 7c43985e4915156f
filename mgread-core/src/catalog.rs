//! Catalog client: maps a `(user, file)` pair onto a path on disk.
//!
//! The catalog service itself is external. [`FileCatalog`] reads a manifest
//! exported from it (YAML, TOML or JSON), which is enough for the read path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::TEST_USER;
use crate::errors::{ReaderError, Result};

/// One file record in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub user_id: String,
    pub file_id: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub file_type: Option<String>,
}

pub trait Catalog {
    ///
    /// Resolve a file identifier owned by a user to its location.
    ///
    /// # Arguments
    /// - user_id: owner of the file, or `common` for shared files
    /// - file_id: catalog identifier of the file
    fn resolve(&self, user_id: &str, file_id: &str) -> Result<PathBuf>;

    ///
    /// List every file registered for a user.
    ///
    fn files_by_user(&self, user_id: &str) -> Result<Vec<CatalogEntry>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    files: Vec<CatalogEntry>,
}

///
/// Catalog backed by a manifest file.
///
/// ```yaml
/// files:
///   - user_id: adam
///     file_id: "5a2f"
///     file_path: models/adam_coords.hdf5
///     file_type: hdf5
/// ```
///
/// Relative `file_path` values are resolved against the manifest's folder.
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    entries: Vec<CatalogEntry>,
}

impl FileCatalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        FileCatalog { entries }
    }

    ///
    /// Load a catalog manifest from disk. The format is picked from the
    /// extension: `.yaml`/`.yml`, `.toml` or `.json`.
    ///
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let manifest: Manifest = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| manifest_error(path, e))?,
            "toml" => toml::from_str(&raw).map_err(|e| manifest_error(path, e))?,
            "json" => serde_json::from_str(&raw).map_err(|e| manifest_error(path, e))?,
            _ => {
                return Err(ReaderError::InvalidArgument(format!(
                    "unsupported catalog manifest format: {}",
                    path.display()
                )));
            }
        };

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let entries = manifest
            .files
            .into_iter()
            .map(|mut entry| {
                if entry.file_path.is_relative() {
                    entry.file_path = base.join(&entry.file_path);
                }
                entry
            })
            .collect::<Vec<_>>();

        debug!(path = %path.display(), entries = entries.len(), "Loaded catalog manifest");

        Ok(FileCatalog { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn manifest_error<E: std::fmt::Display>(path: &Path, err: E) -> ReaderError {
    ReaderError::Schema(format!(
        "cannot parse catalog manifest {}: {}",
        path.display(),
        err
    ))
}

impl Catalog for FileCatalog {
    fn resolve(&self, user_id: &str, file_id: &str) -> Result<PathBuf> {
        self.entries
            .iter()
            .find(|e| e.user_id == user_id && e.file_id == file_id)
            .map(|e| e.file_path.clone())
            .ok_or_else(|| {
                ReaderError::NotFound(format!("file '{}' for user '{}'", file_id, user_id))
            })
    }

    fn files_by_user(&self, user_id: &str) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

///
/// Where a requested file lives.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFile {
    /// The reserved test user: a generated fixture that may not exist yet.
    Fixture(PathBuf),
    /// A file found through the catalog.
    Catalog(PathBuf),
}

impl ResolvedFile {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedFile::Fixture(p) | ResolvedFile::Catalog(p) => p,
        }
    }

    pub fn is_fixture(&self) -> bool {
        matches!(self, ResolvedFile::Fixture(_))
    }
}

///
/// Resolve a `(user, file)` request. The `test` user maps onto the fixture
/// path and never touches the catalog.
///
/// # Arguments
/// - user_id: owner of the file
/// - file_id: catalog identifier of the file
/// - catalog: catalog used for every user other than `test`
/// - fixture: fixture location used for the `test` user
pub fn resolve_file(
    user_id: &str,
    file_id: &str,
    catalog: Option<&dyn Catalog>,
    fixture: &Path,
) -> Result<ResolvedFile> {
    if user_id == TEST_USER {
        return Ok(ResolvedFile::Fixture(fixture.to_path_buf()));
    }

    let catalog = catalog.ok_or_else(|| {
        ReaderError::InvalidArgument(format!(
            "no catalog configured to resolve file '{}' for user '{}'",
            file_id, user_id
        ))
    })?;

    catalog.resolve(user_id, file_id).map(ResolvedFile::Catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[fixture]
    fn catalog() -> FileCatalog {
        let users = ["adam", "ben", "chris", "denis", "eric"];
        let entries = users
            .iter()
            .enumerate()
            .flat_map(|(i, u)| {
                (0..=i).map(move |n| CatalogEntry {
                    user_id: u.to_string(),
                    file_id: format!("{}-{}", u, n),
                    file_path: PathBuf::from(format!("/data/{}/{}.hdf5", u, n)),
                    file_type: Some("hdf5".to_string()),
                })
            })
            .collect();
        FileCatalog::from_entries(entries)
    }

    #[rstest]
    fn test_resolve_known_file(catalog: FileCatalog) {
        let path = catalog.resolve("chris", "chris-1").unwrap();
        assert_eq!(path, PathBuf::from("/data/chris/1.hdf5"));
    }

    #[rstest]
    fn test_resolve_unknown_file(catalog: FileCatalog) {
        let err = catalog.resolve("chris", "adam-0").unwrap_err();
        assert!(matches!(err, ReaderError::NotFound(_)));
    }

    #[rstest]
    fn test_files_by_user(catalog: FileCatalog) {
        for (i, user) in ["adam", "ben", "chris", "denis", "eric"].iter().enumerate() {
            let files = catalog.files_by_user(user).unwrap();
            assert_eq!(files.len(), i + 1);
        }
        assert!(catalog.files_by_user("frank").unwrap().is_empty());
    }

    #[rstest]
    fn test_test_user_skips_catalog() {
        let fixture = PathBuf::from("/tmp/fixtures/sample_coords.coords");
        let resolved = resolve_file(TEST_USER, "", None, &fixture).unwrap();
        assert_eq!(resolved, ResolvedFile::Fixture(fixture));
        assert!(resolved.is_fixture());
    }

    #[rstest]
    fn test_missing_catalog(catalog: FileCatalog) {
        let fixture = PathBuf::from("/unused");
        assert!(matches!(
            resolve_file("adam", "adam-0", None, &fixture),
            Err(ReaderError::InvalidArgument(_))
        ));
        let resolved = resolve_file("adam", "adam-0", Some(&catalog), &fixture).unwrap();
        assert_eq!(resolved.path(), Path::new("/data/adam/0.hdf5"));
    }

    #[rstest]
    #[case("catalog.yaml", "files:\n  - user_id: adam\n    file_id: f1\n    file_path: models/a.hdf5\n")]
    #[case("catalog.toml", "[[files]]\nuser_id = \"adam\"\nfile_id = \"f1\"\nfile_path = \"models/a.hdf5\"\n")]
    #[case("catalog.json", r#"{"files": [{"user_id": "adam", "file_id": "f1", "file_path": "models/a.hdf5"}]}"#)]
    fn test_load_manifest(#[case] name: &str, #[case] body: &str) {
        let tempdir = tempfile::tempdir().unwrap();
        let manifest = tempdir.path().join(name);
        let mut file = std::fs::File::create(&manifest).unwrap();
        file.write_all(body.as_bytes()).unwrap();

        let catalog = FileCatalog::from_path(&manifest).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.resolve("adam", "f1").unwrap(),
            tempdir.path().join("models/a.hdf5")
        );
    }

    #[rstest]
    fn test_load_manifest_unknown_format() {
        let tempdir = tempfile::tempdir().unwrap();
        let manifest = tempdir.path().join("catalog.ini");
        std::fs::write(&manifest, "files=").unwrap();
        assert!(matches!(
            FileCatalog::from_path(&manifest),
            Err(ReaderError::InvalidArgument(_))
        ));
    }
}
