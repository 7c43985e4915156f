//! Sample coordinate stores.
//!
//! Builds a small but complete store with random models, used as the
//! fixture behind the `test` user. Generation is seeded, so the same
//! builder always produces the same store.

use std::ops::Range;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use mgread_core::utils::{FileType, get_file_type};
use mgread_core::{ReaderError, Result};

use crate::index::{
    COORD_DIMS, DESCRIPTIVE_ATTRS, centroids_path, clusters_path, data_path, model_params_path,
    region_params_path,
};
use crate::store::MemoryStore;

/// File name of the generated fixture inside the fixture folder.
#[cfg(feature = "hdf5")]
pub const SAMPLE_COORDS_FIXTURE: &str = "sample_coords.hdf5";
#[cfg(not(feature = "hdf5"))]
pub const SAMPLE_COORDS_FIXTURE: &str = "sample_coords.coords";

pub const SAMPLE_RESOLUTION: u32 = 1000;
pub const SAMPLE_MODELS: usize = 1000;
pub const SAMPLE_CLUSTERS: [i64; 7] = [0, 1, 2, 3, 4, 5, 6];
pub const SAMPLE_CENTROIDS: [i64; 5] = [1, 10, 100, 150, 200];
pub const SAMPLE_CHROMOSOMES: [&str; 7] = ["chr1", "chr2", "chr3", "chr4", "chr5", "chr6", "X"];

fn cluster_hierarchy() -> Vec<Vec<i64>> {
    vec![vec![0, 1, 2], vec![3, 4], vec![5], vec![6]]
}

///
/// Builder for a sample coordinate store.
///
#[derive(Debug, Clone)]
pub struct SampleCoords {
    resolution: u32,
    regions: usize,
    rows: Range<usize>,
    seed: u64,
}

impl Default for SampleCoords {
    fn default() -> Self {
        SampleCoords {
            resolution: SAMPLE_RESOLUTION,
            regions: 10,
            rows: 500..2001,
            seed: 42,
        }
    }
}

impl SampleCoords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_regions(mut self, regions: usize) -> Self {
        self.regions = regions;
        self
    }

    /// Range the number of positions of each region is drawn from.
    pub fn with_rows(mut self, rows: Range<usize>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    ///
    /// Generate the store in memory.
    ///
    pub fn build(&self) -> Result<MemoryStore> {
        if self.rows.is_empty() {
            return Err(ReaderError::InvalidArgument(
                "sample needs at least one position per region".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut store = MemoryStore::new();
        let res = self.resolution;
        store.create_group(&model_params_path(res));

        let mut coords: Vec<i32> = vec![];
        let mut rows = 0usize;

        for region in 0..self.regions {
            let region = region.to_string();

            for (level, members) in cluster_hierarchy().into_iter().enumerate() {
                store.insert_i64(
                    &format!("{}/{}", clusters_path(res, &region), level),
                    vec![members.len()],
                    members,
                )?;
            }
            store.insert_i64(
                &centroids_path(res, &region),
                vec![SAMPLE_CENTROIDS.len()],
                SAMPLE_CENTROIDS.to_vec(),
            )?;

            let positions = rng.random_range(self.rows.clone());
            let mut params = Vec::with_capacity(SAMPLE_MODELS * 2);
            for model in 0..SAMPLE_MODELS {
                let cluster = SAMPLE_CLUSTERS.choose(&mut rng).copied().unwrap_or(0);
                params.extend([model as i64, cluster]);
            }
            // row-major [positions, models, 3]
            coords.extend(
                (0..positions * SAMPLE_MODELS * COORD_DIMS).map(|_| rng.random_range(-1000i32..=1000)),
            );

            let start: i64 = rng.random_range(1..=30_000_000);
            let end = start + rng.random_range(5_000..=100_000);
            let chromosome = SAMPLE_CHROMOSOMES.choose(&mut rng).copied().unwrap_or("chr1");

            let path = region_params_path(res, &region);
            store.insert_i64(&path, vec![SAMPLE_MODELS, 2], params)?;
            store.set_attr(&path, "i", rows as i64)?;
            store.set_attr(&path, "j", (rows + positions) as i64)?;
            store.set_attr(&path, "chromosome", chromosome)?;
            store.set_attr(&path, "start", start)?;
            store.set_attr(&path, "end", end)?;

            rows += positions;
        }

        let data = data_path(res);
        store.insert_i32(&data, vec![rows, SAMPLE_MODELS, COORD_DIMS], coords)?;
        for name in DESCRIPTIVE_ATTRS {
            store.set_attr(&data, name, name)?;
        }
        store.set_attr(&data, "dependencies", r#"{"test": "test"}"#)?;

        Ok(store)
    }

    ///
    /// Generate the store and write it to `path`. `.coords` writes a
    /// snapshot; `.h5`/`.hdf5` writes an HDF5 file (needs the `hdf5` feature).
    ///
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let store = self.build()?;
        match get_file_type(path) {
            FileType::Snapshot => store.save(path)?,
            #[cfg(feature = "hdf5")]
            FileType::Hdf5 => crate::store::h5::export_hdf5(&store, path)?,
            _ => {
                return Err(ReaderError::InvalidArgument(format!(
                    "cannot write a sample store to {}",
                    path.display()
                )));
            }
        }
        info!(path = %path.display(), regions = self.regions, "Wrote sample coordinate store");
        Ok(())
    }
}
