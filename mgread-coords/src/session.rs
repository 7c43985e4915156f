//! Coordinate store session.
//!
//! A [`CoordSession`] owns one open store and, once a resolution is set,
//! the index of that resolution. Queries at the session level return empty
//! values while no resolution is bound; [`CoordSession::bound`] gives the
//! strict view that reports [`ReaderError::Unbound`] instead.

use std::path::Path;

use ndarray::{Array2, Axis};
use tracing::{debug, info};

use mgread_core::{ReaderConfig, ReaderError, ResolvedFile, Result};

use crate::index::{ResolutionIndex, data_path, region_params_path};
use crate::metadata::{self, RegionHeader};
use crate::paging::{
    ColumnLookup, ModelPage, ModelSelector, PageMeta, clamp_page_size, paginate, render_model,
};
use crate::regions::{self, RegionEntry, RegionOrderKey};
use crate::sample::{SAMPLE_COORDS_FIXTURE, SampleCoords};
use crate::store::{CoordStore, open_store};

enum SessionState {
    Open {
        store: Box<dyn CoordStore>,
        index: Option<ResolutionIndex>,
    },
    Closed,
}

///
/// Read-only session over one coordinate store.
///
pub struct CoordSession {
    state: SessionState,
}

impl CoordSession {
    ///
    /// Wrap an already opened store, binding `resolution` when given.
    ///
    pub fn new(store: Box<dyn CoordStore>, resolution: Option<u32>) -> Result<Self> {
        let mut session = CoordSession {
            state: SessionState::Open { store, index: None },
        };
        if let Some(resolution) = resolution {
            // on failure the session, and with it the store, is dropped here
            session.set_resolution(resolution)?;
        }
        Ok(session)
    }

    ///
    /// Open the store behind `(user_id, file_id)`. The `test` user gets the
    /// default sample store, generated into the fixture folder on first use.
    ///
    pub fn open(
        config: &ReaderConfig,
        user_id: &str,
        file_id: &str,
        resolution: Option<u32>,
    ) -> Result<Self> {
        Self::open_with_sample(config, user_id, file_id, resolution, &SampleCoords::default())
    }

    ///
    /// Like [`CoordSession::open`], with the builder used when the `test`
    /// fixture has to be generated.
    ///
    pub fn open_with_sample(
        config: &ReaderConfig,
        user_id: &str,
        file_id: &str,
        resolution: Option<u32>,
        sample: &SampleCoords,
    ) -> Result<Self> {
        let resolved = config.resolve(user_id, file_id, SAMPLE_COORDS_FIXTURE)?;
        if let ResolvedFile::Fixture(path) = &resolved {
            if !path.is_file() {
                info!(path = %path.display(), "Generating sample coordinate store");
                sample.write(path)?;
            }
        }
        Self::open_path(resolved.path(), resolution)
    }

    ///
    /// Open a store file directly.
    ///
    pub fn open_path<P: AsRef<Path>>(path: P, resolution: Option<u32>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), ?resolution, "Opening coordinate store");
        Self::new(open_store(path)?, resolution)
    }

    ///
    /// Release the store. Every later call fails with [`ReaderError::Closed`].
    ///
    pub fn close(&mut self) {
        if matches!(self.state, SessionState::Open { .. }) {
            debug!("Closing coordinate store");
        }
        self.state = SessionState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    fn open_state(&self) -> Result<(&dyn CoordStore, Option<&ResolutionIndex>)> {
        match &self.state {
            SessionState::Open { store, index } => Ok((&**store, index.as_ref())),
            SessionState::Closed => Err(ReaderError::Closed),
        }
    }

    ///
    /// Resolutions present in the store, ascending. Top-level groups whose
    /// names are not integers are ignored.
    ///
    pub fn list_resolutions(&self) -> Result<Vec<u32>> {
        let (store, _) = self.open_state()?;
        let mut resolutions: Vec<u32> = store
            .list_groups("")?
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        resolutions.sort_unstable();
        Ok(resolutions)
    }

    ///
    /// Bind `resolution`, replacing any previous binding. The previous
    /// binding is kept if the new one fails.
    ///
    pub fn set_resolution(&mut self, resolution: u32) -> Result<ResolutionView<'_>> {
        match &mut self.state {
            SessionState::Closed => Err(ReaderError::Closed),
            SessionState::Open { store, index } => {
                let loaded = ResolutionIndex::load(&**store, resolution)?;
                info!(resolution, regions = loaded.regions.len(), "Bound resolution");
                let index = index.insert(loaded);
                Ok(ResolutionView {
                    store: &**store,
                    index,
                })
            }
        }
    }

    /// The bound resolution, `None` when unset.
    pub fn get_resolution(&self) -> Result<Option<u32>> {
        let (_, index) = self.open_state()?;
        Ok(index.map(|i| i.resolution))
    }

    ///
    /// Strict view on the bound resolution.
    ///
    pub fn bound(&self) -> Result<ResolutionView<'_>> {
        match self.open_state()? {
            (store, Some(index)) => Ok(ResolutionView { store, index }),
            (_, None) => Err(ReaderError::Unbound),
        }
    }

    fn view(&self) -> Result<Option<ResolutionView<'_>>> {
        match self.bound() {
            Ok(view) => Ok(Some(view)),
            Err(ReaderError::Unbound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn get_chromosomes(&self) -> Result<Vec<String>> {
        Ok(self.view()?.map(|v| v.chromosomes()).unwrap_or_default())
    }

    pub fn get_regions(&self, chromosome: &str, start: i64, end: i64) -> Result<Vec<String>> {
        Ok(self
            .view()?
            .map(|v| v.regions(chromosome, start, end))
            .unwrap_or_default())
    }

    pub fn get_region_order(&self, key: &RegionOrderKey) -> Result<Vec<String>> {
        match self.view()? {
            Some(view) => view.region_order(key),
            None => Ok(vec![]),
        }
    }

    pub fn get_region_header(&self, region: &str) -> Result<Option<RegionHeader>> {
        self.view()?.map(|v| v.region_header(region)).transpose()
    }

    pub fn get_clusters(&self, region: &str) -> Result<Vec<Vec<i64>>> {
        match self.view()? {
            Some(view) => view.clusters(region),
            None => Ok(vec![]),
        }
    }

    pub fn get_centroids(&self, region: &str) -> Result<Vec<i64>> {
        match self.view()? {
            Some(view) => view.centroids(region),
            None => Ok(vec![]),
        }
    }

    pub fn get_models(&self, region: &str) -> Result<Array2<i64>> {
        match self.view()? {
            Some(view) => view.models(region),
            None => Ok(Array2::zeros((0, 2))),
        }
    }

    pub fn get_model(
        &self,
        region: &str,
        selector: &ModelSelector,
        page: usize,
        page_size: usize,
    ) -> Result<Option<(ModelPage, PageMeta)>> {
        self.view()?
            .map(|v| v.model_page(region, selector, page, page_size))
            .transpose()
    }

    pub fn get_model_coords(&self, region: &str, model_id: i64) -> Result<Vec<[i32; 3]>> {
        match self.view()? {
            Some(view) => view.model_coords(region, model_id),
            None => Ok(vec![]),
        }
    }
}

///
/// Queries against one bound resolution.
///
#[derive(Clone, Copy)]
pub struct ResolutionView<'a> {
    store: &'a dyn CoordStore,
    index: &'a ResolutionIndex,
}

impl<'a> ResolutionView<'a> {
    pub fn resolution(&self) -> u32 {
        self.index.resolution
    }

    pub fn index(&self) -> &'a ResolutionIndex {
        self.index
    }

    pub fn region(&self, region: &str) -> Result<&'a RegionEntry> {
        self.index.region(region)
    }

    pub fn chromosomes(&self) -> Vec<String> {
        regions::chromosomes(self.index)
    }

    pub fn regions(&self, chromosome: &str, start: i64, end: i64) -> Vec<String> {
        regions::overlapping(self.index, chromosome, start, end)
    }

    pub fn region_order(&self, key: &RegionOrderKey) -> Result<Vec<String>> {
        regions::ordered(self.index, key)
    }

    pub fn region_header(&self, region: &str) -> Result<RegionHeader> {
        RegionHeader::build(self.index, region)
    }

    pub fn clusters(&self, region: &str) -> Result<Vec<Vec<i64>>> {
        metadata::clusters(self.store, self.index, region)
    }

    pub fn centroids(&self, region: &str) -> Result<Vec<i64>> {
        metadata::centroids(self.store, self.index, region)
    }

    /// The `(model_id, cluster_id)` table of a region.
    pub fn models(&self, region: &str) -> Result<Array2<i64>> {
        self.region(region)?;
        let table = self
            .store
            .read_table(&region_params_path(self.index.resolution, region))?;
        if table.ncols() < 2 {
            return Err(ReaderError::Schema(format!(
                "model table of region '{}' has {} columns, expected 2",
                region,
                table.ncols()
            )));
        }
        Ok(table)
    }

    fn resolve_selector(&self, region: &str, selector: &ModelSelector) -> Result<Vec<i64>> {
        match selector {
            ModelSelector::Explicit(ids) => Ok(ids.clone()),
            ModelSelector::AllInRegion => Ok(self.models(region)?.column(0).to_vec()),
            ModelSelector::Centroids => self.centroids(region),
        }
    }

    ///
    /// One page of models of `region` with the region's metadata.
    ///
    /// # Arguments
    /// - region: region id
    /// - selector: which models to page over
    /// - page: zero-based page number
    /// - page_size: models per page, clamped to 100
    pub fn model_page(
        &self,
        region: &str,
        selector: &ModelSelector,
        page: usize,
        page_size: usize,
    ) -> Result<(ModelPage, PageMeta)> {
        let entry = self.region(region)?;
        let page_size = clamp_page_size(page_size)?;
        let ids = self.resolve_selector(region, selector)?;
        let (page_ids, meta) = paginate(ids, page, page_size)?;

        let lookup = ColumnLookup::new(self.models(region)?.view());
        let columns = page_ids
            .iter()
            .map(|id| lookup.column(*id))
            .collect::<Result<Vec<_>>>()?;

        // one read for the whole region, models are then cut out of the block
        let block = self
            .store
            .read_slice(&data_path(self.index.resolution), entry.rows())?;
        let models = page_ids
            .iter()
            .zip(columns)
            .map(|(id, column)| render_model(block.view(), *id, column))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            region,
            page,
            page_size,
            model_count = meta.model_count,
            "Assembled model page"
        );

        let header = &self.index.header;
        let model_page = ModelPage {
            metadata: header.tadbit_meta.clone(),
            object: self.region_header(region)?,
            models,
            clusters: self.clusters(region)?,
            centroids: self.centroids(region)?,
            restraints: header.restraints.clone(),
            hic_data: header.hic_data.clone(),
        };
        Ok((model_page, meta))
    }

    ///
    /// The `j - i` coordinate triples of one model.
    ///
    pub fn model_coords(&self, region: &str, model_id: i64) -> Result<Vec<[i32; 3]>> {
        let entry = self.region(region)?;
        let column = ColumnLookup::new(self.models(region)?.view()).column(model_id)?;
        let block = self
            .store
            .read_slice(&data_path(self.index.resolution), entry.rows())?;
        if column >= block.len_of(Axis(1)) {
            return Err(ReaderError::Schema(format!(
                "model {} maps to column {} but the array has {} model columns",
                model_id,
                column,
                block.len_of(Axis(1))
            )));
        }

        Ok(block
            .index_axis(Axis(1), column)
            .outer_iter()
            .map(|xyz| [xyz[0], xyz[1], xyz[2]])
            .collect())
    }
}
