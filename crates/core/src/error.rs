//! Error types for NAIA

use thiserror::Error;

/// Main error type for NAIA operations.
///
/// Only structural problems surface as `Error`. Per-sector and per-indicator
/// failures inside a batch are carried as values in the report instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Band {index} requested from a stack with {count} band(s)")]
    MissingBand { index: usize, count: usize },

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    #[error("Degenerate geometry for sector {id}: {reason}")]
    DegenerateGeometry { id: String, reason: String },

    #[error("Duplicate sector id: {0}")]
    DuplicateSector(String),

    #[error("Sector set is empty")]
    EmptySectorSet,

    #[error("No raster inputs were provided")]
    NoRasterInputs,

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

/// Result type alias for NAIA operations
pub type Result<T> = std::result::Result<T, Error>;
