//! Geographic bounding boxes for study areas

use crate::error::{Error, Result};
use geo::{Polygon, Rect};
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

/// An axis-aligned box in geographic degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a box, rejecting non-finite or inverted corners
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let values = [min_lon, min_lat, max_lon, max_lat];
        if values.iter().any(|v| !v.is_finite()) || min_lon >= max_lon || min_lat >= max_lat {
            return Err(Error::InvalidParameter {
                name: "bbox",
                value: format!("[{min_lon}, {min_lat}, {max_lon}, {max_lat}]"),
                reason: "expected finite corners with min < max".into(),
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    /// Square study area of `size_km` per side centred on a point.
    ///
    /// Degrees of longitude shrink with `cos(lat)`, so the box is wider in
    /// degrees than it is tall away from the equator.
    pub fn around(center_lat: f64, center_lon: f64, size_km: f64) -> Result<Self> {
        if !size_km.is_finite() || size_km <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "size_km",
                value: size_km.to_string(),
                reason: "must be positive".into(),
            });
        }
        if !center_lat.is_finite() || center_lat.abs() >= 90.0 {
            return Err(Error::InvalidParameter {
                name: "center_lat",
                value: center_lat.to_string(),
                reason: "must lie strictly between the poles".into(),
            });
        }

        let lat_degree_km = KM_PER_DEGREE;
        let lon_degree_km = KM_PER_DEGREE * center_lat.to_radians().cos();

        let half_lat = (size_km / 2.0) / lat_degree_km;
        let half_lon = (size_km / 2.0) / lon_degree_km;

        Self::new(
            center_lon - half_lon,
            center_lat - half_lat,
            center_lon + half_lon,
            center_lat + half_lat,
        )
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new((self.min_lon, self.min_lat), (self.max_lon, self.max_lat)).to_polygon()
    }

    pub fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}
