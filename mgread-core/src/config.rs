//! Reader configuration.
//!
//! This module provides [`ReaderConfig`] and its builder. Values left unset on
//! the builder come from the environment (see [`crate::consts`]) and then from
//! built-in defaults.

use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::catalog::{Catalog, FileCatalog, ResolvedFile, resolve_file};
use crate::consts::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MGREAD_CATALOG_ENV, MGREAD_PAGE_SIZE_ENV, TEST_USER,
};
use crate::errors::{ReaderError, Result};
use crate::utils::{expand_path, get_default_fixture_dir};

/// Builder for constructing a [`ReaderConfig`].
///
/// # Examples
///
/// ```rust,no_run
/// use mgread_core::config::ReaderConfig;
/// use std::path::PathBuf;
///
/// # fn main() -> Result<(), mgread_core::ReaderError> {
/// let config = ReaderConfig::builder()
///     .with_catalog(PathBuf::from("/data/catalog.yaml"))
///     .with_page_size(25)
///     .finish()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ReaderConfigBuilder {
    catalog: Option<PathBuf>,
    fixture_dir: Option<PathBuf>,
    page_size: Option<usize>,
}

impl ReaderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog manifest used to resolve `(user, file)` pairs.
    pub fn with_catalog(mut self, path: PathBuf) -> Self {
        self.catalog = Some(path);
        self
    }

    /// Sets the folder where fixtures for the `test` user are generated.
    pub fn with_fixture_dir(mut self, path: PathBuf) -> Self {
        self.fixture_dir = Some(path);
        self
    }

    /// Sets the default number of models per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Consumes the builder and creates a ReaderConfig.
    pub fn finish(self) -> Result<ReaderConfig> {
        let catalog = self
            .catalog
            .or_else(|| env::var(MGREAD_CATALOG_ENV).ok().map(PathBuf::from))
            .map(expand_path);

        let fixture_dir = self
            .fixture_dir
            .map(expand_path)
            .unwrap_or_else(get_default_fixture_dir);

        let page_size = match self.page_size {
            Some(size) => size,
            None => match env::var(MGREAD_PAGE_SIZE_ENV) {
                Ok(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    ReaderError::InvalidArgument(format!(
                        "{} must be a positive integer, got '{}'",
                        MGREAD_PAGE_SIZE_ENV, raw
                    ))
                })?,
                Err(_) => DEFAULT_PAGE_SIZE,
            },
        };

        if page_size == 0 {
            return Err(ReaderError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }
        if page_size > MAX_PAGE_SIZE {
            warn!(page_size, max = MAX_PAGE_SIZE, "Clamping default page size");
        }

        Ok(ReaderConfig {
            catalog,
            fixture_dir,
            page_size: page_size.min(MAX_PAGE_SIZE),
        })
    }
}

/// Settings shared by the coordinate and track readers.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Catalog manifest, if any
    pub catalog: Option<PathBuf>,
    /// Folder holding fixtures for the `test` user
    pub fixture_dir: PathBuf,
    /// Default models per page
    pub page_size: usize,
}

impl ReaderConfig {
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::default()
    }

    ///
    /// Load the configured catalog manifest.
    ///
    pub fn load_catalog(&self) -> Result<Option<FileCatalog>> {
        self.catalog
            .as_ref()
            .map(FileCatalog::from_path)
            .transpose()
    }

    ///
    /// Resolve a `(user, file)` pair, mapping the `test` user onto
    /// `fixture_name` inside the fixture folder.
    ///
    pub fn resolve(&self, user_id: &str, file_id: &str, fixture_name: &str) -> Result<ResolvedFile> {
        let catalog = match user_id {
            TEST_USER => None,
            _ => self.load_catalog()?,
        };
        let fixture = self.fixture_path(fixture_name);
        resolve_file(
            user_id,
            file_id,
            catalog.as_ref().map(|c| c as &dyn Catalog),
            &fixture,
        )
    }

    pub fn fixture_path(&self, fixture_name: &str) -> PathBuf {
        Path::new(&self.fixture_dir).join(fixture_name)
    }
}
