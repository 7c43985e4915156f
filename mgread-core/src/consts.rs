//! Constants shared by the mgread crates.
//!
//! Environment variable names, the reserved test user and paging limits.

// Environment variable names

/// Environment variable pointing at the catalog manifest.
///
/// # Example
///
/// ```bash
/// export MGREAD_CATALOG=/data/catalog.yaml
/// ```
pub const MGREAD_CATALOG_ENV: &str = "MGREAD_CATALOG";

/// Environment variable overriding the directory where sample fixtures are
/// generated for the `test` user (default `~/.mgread/fixtures/`).
pub const MGREAD_FIXTURE_DIR_ENV: &str = "MGREAD_FIXTURE_DIR";

/// Environment variable overriding the default number of models per page.
pub const MGREAD_PAGE_SIZE_ENV: &str = "MGREAD_PAGE_SIZE";

/// Reserved user id. Requests for this user resolve to generated fixtures
/// instead of going through the catalog.
pub const TEST_USER: &str = "test";

/// Upper bound for models per page. Larger requests are clamped.
pub const MAX_PAGE_SIZE: usize = 100;

/// Models per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default subdirectory of the home folder holding generated fixtures.
pub const DEFAULT_FIXTURE_SUBFOLDER: &str = ".mgread/fixtures";
