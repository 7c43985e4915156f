use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use dirs::home_dir;

use crate::consts::{DEFAULT_FIXTURE_SUBFOLDER, MGREAD_FIXTURE_DIR_ENV};

///
/// Kinds of files the readers know how to open, detected from the extension.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Hdf5,
    Snapshot,
    BigBed,
    BigWig,
    Unknown,
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h5" | "hdf5" => Ok(FileType::Hdf5),
            "coords" => Ok(FileType::Snapshot),
            "bb" | "bigbed" => Ok(FileType::BigBed),
            "bw" | "bigwig" => Ok(FileType::BigWig),
            _ => Ok(FileType::Unknown),
        }
    }
}

///
/// Get the file type of a path from its extension.
///
pub fn get_file_type(path: &Path) -> FileType {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| FileType::from_str(ext).unwrap_or(FileType::Unknown))
        .unwrap_or(FileType::Unknown)
}

///
/// Expand `~` and environment variables in a user supplied path.
///
pub fn expand_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let raw = path.as_ref().to_string_lossy().into_owned();
    let expanded = shellexpand::full(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw);
    PathBuf::from(expanded)
}

/// Get the default fixture folder from the environment, falling back to a
/// folder in the home directory.
///
/// # Returns
/// - path to fixture folder
pub fn get_default_fixture_dir() -> PathBuf {
    if let Ok(val) = env::var(MGREAD_FIXTURE_DIR_ENV) {
        return expand_path(val);
    }

    let home = home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join(DEFAULT_FIXTURE_SUBFOLDER)
}
