//! A single administrative sector

use crate::error::{Error, Result};
use geo::{Area, BoundingRect, Centroid, CoordsIter, GeodesicArea, MultiPolygon, Point, Polygon, Rect};

/// Immutable administrative unit in geographic coordinates (EPSG:4326).
///
/// The centroid and area are derived once at construction. A sector whose
/// polygon has zero area is kept (so it still appears in reports) but is
/// flagged as degenerate and excluded from spatial sampling.
#[derive(Debug, Clone)]
pub struct Sector {
    id: String,
    geometry: MultiPolygon<f64>,
    centroid: Point<f64>,
    area_km2: f64,
    degenerate: bool,
}

impl Sector {
    /// Build a sector, deriving centroid and geodesic area.
    ///
    /// Fails when the id is blank, the geometry holds no polygon, or any
    /// vertex is non-finite.
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidParameter {
                name: "sector_id",
                value: format!("{id:?}"),
                reason: "sector id must not be blank".into(),
            });
        }
        if geometry.0.is_empty() {
            return Err(Error::DegenerateGeometry {
                id,
                reason: "geometry has no polygons".into(),
            });
        }
        if geometry
            .coords_iter()
            .any(|c| !c.x.is_finite() || !c.y.is_finite())
        {
            return Err(Error::DegenerateGeometry {
                id,
                reason: "geometry has non-finite coordinates".into(),
            });
        }

        let degenerate = geometry.unsigned_area() <= 0.0;
        let centroid = geometry
            .centroid()
            .or_else(|| geometry.bounding_rect().map(|r| r.center().into()))
            .ok_or_else(|| Error::DegenerateGeometry {
                id: id.clone(),
                reason: "centroid is undefined".into(),
            })?;
        let area_km2 = if degenerate {
            0.0
        } else {
            geometry.geodesic_area_unsigned() / 1_000_000.0
        };

        Ok(Self {
            id,
            geometry,
            centroid,
            area_km2,
            degenerate,
        })
    }

    /// Convenience constructor for a single polygon
    pub fn from_polygon(id: impl Into<String>, polygon: Polygon<f64>) -> Result<Self> {
        Self::new(id, MultiPolygon(vec![polygon]))
    }

    /// Replace the derived area with an authoritative value from the source.
    ///
    /// Non-finite or negative values are ignored.
    pub fn with_area_km2(mut self, area_km2: f64) -> Self {
        if area_km2.is_finite() && area_km2 >= 0.0 {
            self.area_km2 = area_km2;
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn centroid(&self) -> Point<f64> {
        self.centroid
    }

    pub fn area_km2(&self) -> f64 {
        self.area_km2
    }

    /// Whether the polygon encloses zero area
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Bounding rectangle in geographic coordinates
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::LineString;

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
                (x0, y0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_sector_derives_centroid_and_area() {
        let sector = Sector::from_polygon("3509502", square(-47.1, -22.9, 0.01)).unwrap();

        assert_relative_eq!(sector.centroid().x(), -47.095, epsilon = 1e-9);
        assert_relative_eq!(sector.centroid().y(), -22.895, epsilon = 1e-9);
        // 0.01° x 0.01° near -22.9° is about 1.11 km x 1.03 km
        assert!(sector.area_km2() > 1.0 && sector.area_km2() < 1.25);
        assert!(!sector.is_degenerate());
    }

    #[test]
    fn test_area_override() {
        let sector = Sector::from_polygon("a", square(0.0, 0.0, 0.01))
            .unwrap()
            .with_area_km2(2.5)
            .with_area_km2(f64::NAN);
        assert_relative_eq!(sector.area_km2(), 2.5);
    }

    #[test]
    fn test_zero_area_is_flagged() {
        let flat = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]),
            vec![],
        );
        let sector = Sector::from_polygon("flat", flat).unwrap();
        assert!(sector.is_degenerate());
        assert_eq!(sector.area_km2(), 0.0);
    }

    #[test]
    fn test_invalid_sectors_rejected() {
        assert!(Sector::from_polygon("  ", square(0.0, 0.0, 1.0)).is_err());
        assert!(matches!(
            Sector::new("empty", MultiPolygon(vec![])),
            Err(Error::DegenerateGeometry { .. })
        ));
        assert!(Sector::from_polygon("nan", square(f64::NAN, 0.0, 1.0)).is_err());
    }
}
