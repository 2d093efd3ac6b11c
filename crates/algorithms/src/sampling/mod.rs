//! Raster sampling under sector polygons
//!
//! Two strategies:
//! - **clip**: every pixel whose centre falls inside the (reprojected)
//!   polygon, for grids much finer than the sector
//! - **nearest**: the cell under the centroid, searching outward ring by
//!   ring for a valid value, for grids as coarse as the sector itself
//!
//! Sampling returns cell positions, not values, so that paired bands
//! (red/NIR) are read from exactly the same cells.

mod clip;
mod nearest;

use naia_core::raster::{Raster, RasterStack};
use naia_core::vector::Sector;
use naia_core::{Error, Projection, Result};
use serde::{Deserialize, Serialize};

pub use clip::clip_cells;
pub use nearest::nearest_cell;

/// Requested sampling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMethod {
    /// Clip for fine grids, nearest for coarse ones
    #[default]
    Auto,
    Clip,
    Nearest,
}

/// Parameters for [`sample`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerParams {
    #[serde(default)]
    pub method: SamplingMethod,
    /// A grid counts as coarse when a pixel is at least this fraction of the
    /// sector's bounding box along either axis.
    #[serde(default = "default_coarse_ratio")]
    pub coarse_ratio: f64,
    /// Largest ring radius searched around the centroid cell
    #[serde(default = "default_max_ring")]
    pub max_ring: usize,
}

fn default_coarse_ratio() -> f64 {
    1.0
}

fn default_max_ring() -> usize {
    1
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            method: SamplingMethod::default(),
            coarse_ratio: default_coarse_ratio(),
            max_ring: default_max_ring(),
        }
    }
}

impl SamplerParams {
    pub fn validate(&self) -> Result<()> {
        if !self.coarse_ratio.is_finite() || self.coarse_ratio <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "coarse_ratio",
                value: self.coarse_ratio.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// How a pixel set was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SampleMethod {
    /// Pixel centres inside the polygon
    Clip,
    /// Nearest valid cell, found at the given ring radius
    Nearest { ring: usize },
    /// The sector does not overlap the grid
    Outside,
}

/// Cells selected for one sector on one grid.
///
/// `cells` holds only positions valid in every requested band; `covered`
/// counts the cells the sector touched before the validity filter, which
/// tells "all no-data" apart from "no overlap".
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSet {
    pub cells: Vec<(usize, usize)>,
    pub covered: usize,
    pub method: SampleMethod,
}

impl PixelSet {
    pub fn outside() -> Self {
        Self {
            cells: Vec::new(),
            covered: 0,
            method: SampleMethod::Outside,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_outside(&self) -> bool {
        self.method == SampleMethod::Outside
    }

    /// Values of `band` at the selected cells
    pub fn values<'a>(&'a self, band: &'a Raster<f64>) -> impl Iterator<Item = f64> + 'a {
        self.cells
            .iter()
            .filter_map(move |&(row, col)| band.valid_value(row, col))
    }
}

/// Select the cells of `stack` that represent `sector`.
///
/// `bands` lists the bands that must all be valid at a selected cell.
/// `projection` maps the sector's WGS84 coordinates into the stack's CRS.
///
/// A sector wholly outside the grid yields [`SampleMethod::Outside`], not an
/// error. Errors are reserved for geometry problems (degenerate polygon,
/// failed reprojection) and missing bands.
pub fn sample(
    stack: &RasterStack,
    bands: &[usize],
    sector: &Sector,
    projection: Projection,
    params: &SamplerParams,
) -> Result<PixelSet> {
    if sector.is_degenerate() {
        return Err(Error::DegenerateGeometry {
            id: sector.id().to_string(),
            reason: "polygon has zero area".into(),
        });
    }

    let layers = bands
        .iter()
        .map(|&b| stack.band(b))
        .collect::<Result<Vec<_>>>()?;
    let Some(grid) = layers.first() else {
        return Ok(PixelSet::outside());
    };
    let is_valid = |row: usize, col: usize| layers.iter().all(|b| b.valid_value(row, col).is_some());

    let geometry = projection.project_multipolygon(sector.geometry())?;
    let centroid = sector.centroid();
    let centroid = projection.forward(centroid.x(), centroid.y())?;

    let transform = grid.transform();
    let (rows, cols) = grid.shape();

    let coarse = match params.method {
        SamplingMethod::Clip => false,
        SamplingMethod::Nearest => true,
        SamplingMethod::Auto => is_coarse(&geometry, transform.pixel_size(), params.coarse_ratio),
    };

    if !coarse {
        let set = clip_cells(&geometry, transform, rows, cols, is_valid);
        let fallback = params.method == SamplingMethod::Auto && set.covered == 0 && !set.is_outside();
        if !fallback {
            tracing::debug!(
                "Sector {}: clipped {} of {} covered cells",
                sector.id(),
                set.len(),
                set.covered
            );
            return Ok(set);
        }
        tracing::debug!(
            "Sector {}: no pixel centre inside polygon, using nearest cell",
            sector.id()
        );
    }

    let set = nearest_cell(&geometry, centroid, grid, params.max_ring, is_valid);
    tracing::debug!("Sector {}: {:?}", sector.id(), set.method);
    Ok(set)
}

/// Whether one pixel is comparable to or larger than the sector extent
fn is_coarse(
    geometry: &geo::MultiPolygon<f64>,
    (pixel_w, pixel_h): (f64, f64),
    ratio: f64,
) -> bool {
    use geo::BoundingRect;

    match geometry.bounding_rect() {
        Some(rect) => pixel_w >= rect.width() * ratio || pixel_h >= rect.height() * ratio,
        None => true,
    }
}
