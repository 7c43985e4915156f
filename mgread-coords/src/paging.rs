//! Model selection and pagination.
//!
//! A request names its models with a [`ModelSelector`]. The selector is
//! resolved to a concrete id list first, the list is sorted and
//! de-duplicated, and only then is it cut into pages.

use std::collections::HashMap;
use std::str::FromStr;

use ndarray::{ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use mgread_core::consts::MAX_PAGE_SIZE;
use mgread_core::{ReaderError, Result};

use crate::metadata::RegionHeader;

/// Token selecting every model of the region.
pub const ALL_TOKEN: &str = "all";

/// Token selecting the centroid models of the region.
pub const CENTROIDS_TOKEN: &str = "centroids";

///
/// Which models of a region a page is drawn from.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelector {
    Explicit(Vec<i64>),
    AllInRegion,
    Centroids,
}

impl ModelSelector {
    ///
    /// Parse request tokens. `all` and `centroids` are only recognised as
    /// the sole token; anything else must be a list of integers.
    ///
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        match tokens {
            [] => Err(ReaderError::InvalidArgument(
                "no model ids were given".to_string(),
            )),
            [single] if single.as_ref().trim() == ALL_TOKEN => Ok(ModelSelector::AllInRegion),
            [single] if single.as_ref().trim() == CENTROIDS_TOKEN => Ok(ModelSelector::Centroids),
            _ => tokens
                .iter()
                .map(|t| {
                    let t = t.as_ref().trim();
                    t.parse::<i64>().map_err(|_| {
                        ReaderError::InvalidArgument(format!("'{}' is not a model id", t))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(ModelSelector::Explicit),
        }
    }
}

impl FromStr for ModelSelector {
    type Err = ReaderError;

    /// Comma separated form, e.g. `"1,5,9"`, `"all"` or `"centroids"`.
    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split(',').filter(|t| !t.trim().is_empty()).collect();
        ModelSelector::parse(&tokens)
    }
}

///
/// Totals of a paged selection.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Distinct model ids in the selection; repeated ids count once
    pub model_count: usize,
    pub page_count: usize,
}

///
/// Coordinates of one model. `data` is the flat `x0, y0, z0, x1, ...`
/// sequence rendered as strings.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCoords {
    #[serde(rename = "ref")]
    pub model_ref: String,
    pub data: Vec<String>,
}

///
/// One page of models with the metadata of their region.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPage {
    pub metadata: Value,
    pub object: RegionHeader,
    pub models: Vec<ModelCoords>,
    pub clusters: Vec<Vec<i64>>,
    pub centroids: Vec<i64>,
    pub restraints: Value,
    pub hic_data: Value,
}

///
/// Validate a requested page size, clamping it to [`MAX_PAGE_SIZE`].
///
pub fn clamp_page_size(page_size: usize) -> Result<usize> {
    if page_size == 0 {
        return Err(ReaderError::InvalidArgument(
            "page size must be at least 1".to_string(),
        ));
    }
    if page_size > MAX_PAGE_SIZE {
        warn!(page_size, max = MAX_PAGE_SIZE, "Clamping page size");
    }
    Ok(page_size.min(MAX_PAGE_SIZE))
}

///
/// Sort and de-duplicate `ids`, then return page `page` of them.
///
/// # Arguments
/// - ids: resolved model ids, in any order
/// - page: zero-based page number
/// - page_size: models per page, already clamped
pub fn paginate(mut ids: Vec<i64>, page: usize, page_size: usize) -> Result<(Vec<i64>, PageMeta)> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Err(ReaderError::InvalidArgument(
            "the selection contains no models".to_string(),
        ));
    }

    let meta = PageMeta {
        model_count: ids.len(),
        page_count: ids.len().div_ceil(page_size),
    };
    if page >= meta.page_count {
        return Err(ReaderError::OutOfRange {
            page,
            page_count: meta.page_count,
        });
    }

    let begin = page * page_size;
    let end = (begin + page_size).min(ids.len());
    Ok((ids[begin..end].to_vec(), meta))
}

///
/// Maps model ids to their column in the coordinate array, using the model
/// id column of a region's parameter table.
///
pub struct ColumnLookup {
    columns: HashMap<i64, usize>,
}

impl ColumnLookup {
    pub fn new(model_params: ArrayView2<i64>) -> Self {
        let mut columns = HashMap::with_capacity(model_params.nrows());
        for (column, id) in model_params.column(0).iter().enumerate() {
            // first occurrence wins
            columns.entry(*id).or_insert(column);
        }
        ColumnLookup { columns }
    }

    pub fn column(&self, model_id: i64) -> Result<usize> {
        self.columns
            .get(&model_id)
            .copied()
            .ok_or_else(|| ReaderError::NotFound(format!("model {}", model_id)))
    }
}

///
/// Flatten one model column of a region block (`[rows, models, 3]`) into
/// its string form. A column past the model axis is a schema error.
///
pub fn render_model(block: ArrayView3<i32>, model_id: i64, column: usize) -> Result<ModelCoords> {
    let models = block.len_of(Axis(1));
    if column >= models {
        return Err(ReaderError::Schema(format!(
            "model {} maps to column {} but the array has {} model columns",
            model_id, column, models
        )));
    }
    Ok(ModelCoords {
        model_ref: model_id.to_string(),
        data: block
            .index_axis(Axis(1), column)
            .iter()
            .map(|v| v.to_string())
            .collect(),
    })
}
