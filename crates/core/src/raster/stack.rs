//! Multi-band rasters sharing one grid

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// An ordered set of co-registered bands.
///
/// Every band has the same shape; the stack reports the first band's
/// transform and CRS.
#[derive(Debug, Clone)]
pub struct RasterStack {
    bands: Vec<Raster<f64>>,
}

impl RasterStack {
    /// Build a stack, rejecting bands whose shape differs from the first.
    pub fn new(bands: Vec<Raster<f64>>) -> Result<Self> {
        if let Some(first) = bands.first() {
            let (er, ec) = first.shape();
            for band in &bands[1..] {
                let (ar, ac) = band.shape();
                if (ar, ac) != (er, ec) {
                    return Err(Error::SizeMismatch { er, ec, ar, ac });
                }
            }
        }
        Ok(Self { bands })
    }

    /// A stack holding a single band
    pub fn single(band: Raster<f64>) -> Self {
        Self { bands: vec![band] }
    }

    /// Band at zero-based `index`
    pub fn band(&self, index: usize) -> Result<&Raster<f64>> {
        self.bands.get(index).ok_or(Error::MissingBand {
            index,
            count: self.bands.len(),
        })
    }

    pub fn bands(&self) -> &[Raster<f64>] {
        &self.bands
    }

    pub fn count(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Shared (rows, cols), or (0, 0) for an empty stack
    pub fn shape(&self) -> (usize, usize) {
        self.bands.first().map_or((0, 0), Raster::shape)
    }

    pub fn transform(&self) -> Option<&GeoTransform> {
        self.bands.first().map(Raster::transform)
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.bands.first().and_then(Raster::crs)
    }

    /// Set the CRS on every band
    pub fn with_crs(mut self, crs: CRS) -> Self {
        for band in &mut self.bands {
            band.set_crs(Some(crs.clone()));
        }
        self
    }
}
