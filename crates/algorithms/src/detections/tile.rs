//! Georeferencing of detections found in Web Mercator map tiles

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// A map image centred on a geographic point at a given zoom level.
///
/// World pixel coordinates follow the Web Mercator tiling scheme: the
/// world is `256 · 2^zoom` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileFrame {
    pub center_lat: f64,
    pub center_lon: f64,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
}

fn default_zoom() -> u8 {
    19
}

fn default_size() -> u32 {
    640
}

impl TileFrame {
    pub fn new(center_lat: f64, center_lon: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            zoom: default_zoom(),
            width: default_size(),
            height: default_size(),
        }
    }

    /// World pixels per radian
    fn scale(&self) -> f64 {
        256.0 / (2.0 * PI) * 2f64.powi(i32::from(self.zoom))
    }

    /// Geographic (lon, lat) of image pixel (`px`, `py`), origin top-left
    pub fn pixel_to_lonlat(&self, px: f64, py: f64) -> (f64, f64) {
        let c = self.scale();

        let center_x = c * (self.center_lon.to_radians() + PI);
        let center_y = c * (PI - (FRAC_PI_4 + self.center_lat.to_radians() / 2.0).tan().ln());

        let world_x = center_x + (px - f64::from(self.width) / 2.0);
        let world_y = center_y + (py - f64::from(self.height) / 2.0);

        let lon = (world_x / c - PI).to_degrees();
        let lat = (2.0 * (PI - world_y / c).exp().atan() - FRAC_PI_2).to_degrees();
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_pixel_maps_to_center() {
        let frame = TileFrame::new(-22.8199, -47.0713);
        let (lon, lat) = frame.pixel_to_lonlat(320.0, 320.0);
        assert_relative_eq!(lon, -47.0713, epsilon = 1e-9);
        assert_relative_eq!(lat, -22.8199, epsilon = 1e-9);
    }

    #[test]
    fn test_offsets_move_in_expected_directions() {
        let frame = TileFrame::new(-22.8199, -47.0713);
        let (lon_right, lat_down) = frame.pixel_to_lonlat(640.0, 640.0);
        assert!(lon_right > -47.0713);
        assert!(lat_down < -22.8199);

        // one world pixel at zoom 19 is 360 / 2^27 degrees of longitude
        let (lon_next, _) = frame.pixel_to_lonlat(321.0, 320.0);
        assert_relative_eq!(lon_next + 47.0713, 360.0 / 2f64.powi(27), epsilon = 1e-12);
    }
}
