//! Coordinate Reference System handling

mod transform;

pub use transform::{parse_utm_epsg, Projection};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of geographic WGS84, the CRS sector geometries are stored in.
pub const WGS84_EPSG: u32 = 4326;

/// EPSG code of spherical Web Mercator.
pub const WEB_MERCATOR_EPSG: u32 = 3857;

/// Coordinate Reference System, identified by its EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(WGS84_EPSG)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(WEB_MERCATOR_EPSG)
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Resolve the projection that maps WGS84 longitude/latitude into this CRS.
    pub fn projection(&self) -> Result<Projection> {
        Projection::from_crs(self)
    }

    /// `EPSG:<code>`
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}
