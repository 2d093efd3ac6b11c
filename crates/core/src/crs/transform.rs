//! Pure-Rust forward projections from WGS84 longitude/latitude.
//!
//! Sector polygons live in EPSG:4326; rasters may come in UTM (Sentinel-1/2
//! tiles, SIRGAS 2000 products) or Web Mercator (map tiles). UTM follows
//! Snyder 1987 (USGS Prof. Paper 1395, pp. 61-64). SIRGAS 2000 is treated as
//! coincident with WGS84, which holds to well under a metre.

use super::{CRS, WEB_MERCATOR_EPSG, WGS84_EPSG};
use crate::error::{Error, Result};
use geo::{Coord, MapCoords, MultiPolygon};

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Web Mercator is only defined up to this latitude.
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// SIRGAS 2000 geographic.
const SIRGAS2000_EPSG: u32 = 4674;

/// A forward projection from WGS84 (lon, lat) degrees into a raster CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Target is geographic; coordinates pass through unchanged.
    Geographic,
    /// Spherical Web Mercator, metres.
    WebMercator,
    /// Universal Transverse Mercator, metres.
    Utm { zone: u32, north: bool },
}

impl Projection {
    /// Resolve the projection for a target CRS.
    ///
    /// Fails with [`Error::UnsupportedCrs`] for anything other than
    /// EPSG:4326/4674, EPSG:3857, WGS84 UTM (326xx/327xx) and SIRGAS 2000
    /// UTM south zones (31978-31985).
    pub fn from_crs(crs: &CRS) -> Result<Self> {
        let code = crs.epsg();
        match code {
            WGS84_EPSG | SIRGAS2000_EPSG => Ok(Projection::Geographic),
            WEB_MERCATOR_EPSG => Ok(Projection::WebMercator),
            _ => parse_utm_epsg(code)
                .map(|(zone, north)| Projection::Utm { zone, north })
                .ok_or_else(|| Error::UnsupportedCrs(crs.identifier())),
        }
    }

    /// Whether this projection leaves coordinates untouched.
    pub fn is_identity(&self) -> bool {
        matches!(self, Projection::Geographic)
    }

    /// Project a single WGS84 point.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
            return Err(Error::Reprojection(format!(
                "invalid geographic coordinate ({lon}, {lat})"
            )));
        }

        let (x, y) = match *self {
            Projection::Geographic => (lon, lat),
            Projection::WebMercator => {
                if lat.abs() > MERCATOR_MAX_LAT {
                    return Err(Error::Reprojection(format!(
                        "latitude {lat} outside the Web Mercator domain"
                    )));
                }
                wgs84_to_web_mercator(lon, lat)
            }
            Projection::Utm { zone, north } => wgs84_to_utm(lon, lat, zone, north),
        };

        if x.is_finite() && y.is_finite() {
            Ok((x, y))
        } else {
            Err(Error::Reprojection(format!(
                "non-finite result projecting ({lon}, {lat})"
            )))
        }
    }

    /// Project every vertex of a multipolygon.
    pub fn project_multipolygon(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|c| self.forward(c.x, c.y).map(|(x, y)| Coord { x, y }))
    }
}

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
/// - EPSG 31978-31985 → SIRGAS 2000 zones 18S-25S
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else if (31978..=31985).contains(&epsg) {
        Some((epsg - 31960, false))
    } else {
        None
    }
}

fn wgs84_to_web_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let x = A * lon_deg.to_radians();
    let y = A * (std::f64::consts::FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    let lon0 = ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);
    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = K0
        * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    if north {
        (easting, northing)
    } else {
        (easting, northing + FALSE_NORTHING_SOUTH)
    }
}

/// Meridional arc from equator to latitude `lat` (radians). Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    #[test]
    fn parse_utm_zones() {
        assert_eq!(parse_utm_epsg(32630), Some((30, true)));
        assert_eq!(parse_utm_epsg(32723), Some((23, false)));
        assert_eq!(parse_utm_epsg(31983), Some((23, false)));
        assert_eq!(parse_utm_epsg(32600), None);
        assert_eq!(parse_utm_epsg(4326), None);
    }

    #[test]
    fn projection_from_crs() {
        assert_eq!(Projection::from_crs(&CRS::wgs84()).unwrap(), Projection::Geographic);
        assert_eq!(
            Projection::from_crs(&CRS::web_mercator()).unwrap(),
            Projection::WebMercator
        );
        assert_eq!(
            Projection::from_crs(&CRS::from_epsg(32723)).unwrap(),
            Projection::Utm { zone: 23, north: false }
        );
        assert!(Projection::from_crs(&CRS::from_epsg(2154)).is_err());
    }

    // Reference values from pyproj (PROJ 9.x), always_xy=True
    #[test]
    fn madrid_wgs84_to_utm30n() {
        let (e, n) = wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_close(e, 440_298.94, 1.0, "easting");
        assert_close(n, 4_474_257.31, 1.0, "northing");
    }

    #[test]
    fn buenos_aires_wgs84_to_utm21s() {
        let (e, n) = wgs84_to_utm(-58.3816, -34.6037, 21, false);
        assert_close(e, 373_317.50, 1.0, "easting");
        assert_close(n, 6_170_036.17, 1.0, "northing");
    }

    #[test]
    fn web_mercator_origin_and_edge() {
        let p = Projection::WebMercator;
        let (x, y) = p.forward(0.0, 0.0).unwrap();
        assert_close(x, 0.0, 1e-6, "x at origin");
        assert_close(y, 0.0, 1e-6, "y at origin");

        let (x, _) = p.forward(180.0, 0.0).unwrap();
        assert_close(x, 20_037_508.34, 0.01, "x at antimeridian");

        assert!(p.forward(0.0, 89.0).is_err());
    }

    #[test]
    fn forward_rejects_invalid_input() {
        let p = Projection::Utm { zone: 23, north: false };
        assert!(p.forward(f64::NAN, -22.8).is_err());
        assert!(p.forward(-47.0, 95.0).is_err());
    }

    #[test]
    fn project_polygon_keeps_shape() {
        let poly = Polygon::new(
            LineString::from(vec![
                (-47.07, -22.82),
                (-47.06, -22.82),
                (-47.06, -22.81),
                (-47.07, -22.81),
                (-47.07, -22.82),
            ]),
            vec![],
        );
        let mp = MultiPolygon(vec![poly]);
        let projected = Projection::Utm { zone: 23, north: false }
            .project_multipolygon(&mp)
            .unwrap();

        let ring = projected.0[0].exterior();
        assert_eq!(ring.0.len(), 5);
        // 0.01° of longitude near -22.8° is roughly 1 km
        let width = ring.0[1].x - ring.0[0].x;
        assert!(width > 900.0 && width < 1_100.0, "width ~1km, got {width}");
        assert!(ring.0[0].y > 7_000_000.0, "southern northing offset");
    }
}
