//! # NAIA Core
//!
//! Core types and I/O for the NAIA sector risk-scoring engine.
//!
//! This crate provides:
//! - `Raster<T>` and `RasterStack`: georeferenced single- and multi-band grids
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS` and `Projection`: CRS tags and WGS84 forward projections
//! - `Sector` and `SectorRegistry`: administrative polygons with an R-tree index
//! - I/O for GeoTIFF rasters and GeoJSON sector collections

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::{Projection, CRS};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement, RasterStack};
pub use vector::{BoundingBox, Sector, SectorRegistry};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Projection, CRS};
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement, RasterStack, Ring};
    pub use crate::vector::{BoundingBox, Sector, SectorRegistry};
}
