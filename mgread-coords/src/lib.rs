//! # mgread-coords
//!
//! Paged, read-only access to 3D chromosome structure models.
//!
//! Models are stored per resolution as one large `[positions, models, 3]`
//! integer array, with per-region tables saying which rows belong to which
//! genomic region and which column belongs to which model. A
//! [`CoordSession`] binds one resolution at a time and answers region,
//! metadata and model page queries against it.
//!
//! ```rust,no_run
//! use mgread_coords::{CoordSession, ModelSelector};
//! use mgread_core::ReaderConfig;
//!
//! # fn main() -> Result<(), mgread_core::ReaderError> {
//! let config = ReaderConfig::builder().finish()?;
//! let mut session = CoordSession::open(&config, "test", "", None)?;
//! let resolution = session.list_resolutions()?[0];
//! let view = session.set_resolution(resolution)?;
//!
//! let chromosome = &view.chromosomes()[0];
//! let region = &view.regions(chromosome, 0, i64::MAX)[0];
//! let (page, meta) = view.model_page(region, &ModelSelector::Centroids, 0, 10)?;
//! println!("{} of {} models", page.models.len(), meta.model_count);
//! # Ok(())
//! # }
//! ```
pub mod index;
pub mod metadata;
pub mod paging;
pub mod regions;
pub mod sample;
pub mod session;
pub mod store;

// re-exports
pub use index::{DatasetHeader, ResolutionIndex};
pub use metadata::RegionHeader;
pub use paging::{ModelCoords, ModelPage, ModelSelector, PageMeta};
pub use regions::{RegionEntry, RegionOrderKey};
pub use sample::{SAMPLE_COORDS_FIXTURE, SampleCoords};
pub use session::{CoordSession, ResolutionView};
pub use store::{AttrValue, Attributes, CoordStore, MemoryStore, SnapshotStore, open_store};
