//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and map coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images, `row_rotation` and `col_rotation` are 0 and
/// `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Map coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map coordinates of the pixel's top-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Convert map coordinates to fractional pixel coordinates (col, row).
    ///
    /// Use `.floor()` to get the containing cell. A degenerate transform
    /// yields NaN.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-18 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Ground size of one pixel along its column and row axes.
    pub fn pixel_size(&self) -> (f64, f64) {
        let w = self.pixel_width.hypot(self.col_rotation);
        let h = self.row_rotation.hypot(self.pixel_height);
        (w, h)
    }

    /// Bounding box (min_x, min_y, max_x, max_y) for a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(width, 0);
        let (x2, y2) = self.pixel_to_geo_corner(0, height);
        let (x3, y3) = self.pixel_to_geo_corner(width, height);

        let min_x = x0.min(x1).min(x2).min(x3);
        let max_x = x0.max(x1).max(x2).max(x3);
        let min_y = y0.min(y1).min(y2).min(y3);
        let max_y = y0.max(y1).max(y2).max(y3);

        (min_x, min_y, max_x, max_y)
    }

    /// Pixel window (col_start, row_start, col_end, row_end), end-exclusive,
    /// covering a map-space rectangle, clamped to a `width` x `height` grid.
    ///
    /// Returns `None` when the rectangle misses the grid entirely.
    pub fn window(
        &self,
        (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
        width: usize,
        height: usize,
    ) -> Option<(usize, usize, usize, usize)> {
        let corners = [
            self.geo_to_pixel(min_x, min_y),
            self.geo_to_pixel(min_x, max_y),
            self.geo_to_pixel(max_x, min_y),
            self.geo_to_pixel(max_x, max_y),
        ];
        if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
            return None;
        }

        let col_min = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let col_max = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let row_min = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let row_max = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        if col_max < 0.0 || row_max < 0.0 || col_min >= width as f64 || row_min >= height as f64 {
            return None;
        }

        let c0 = col_min.floor().max(0.0) as usize;
        let r0 = row_min.floor().max(0.0) as usize;
        let c1 = (col_max.ceil().max(0.0) as usize).min(width);
        let r1 = (row_max.ceil().max(0.0) as usize).min(height);

        if c0 >= c1 || r0 >= r1 {
            return None;
        }
        Some((c0, r0, c1, r1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_roundtrip() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        let (col, row) = gt.geo_to_pixel(x, y);

        assert_relative_eq!(col, 5.5, epsilon = 1e-10);
        assert_relative_eq!(row, 10.5, epsilon = 1e-10);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pixel_size() {
        let gt = GeoTransform::new(0.0, 0.0, 0.1, -0.25);
        let (w, h) = gt.pixel_size();
        assert_relative_eq!(w, 0.1, epsilon = 1e-12);
        assert_relative_eq!(h, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_window_clamps_to_grid() {
        let gt = GeoTransform::new(0.0, 10.0, 1.0, -1.0);

        assert_eq!(gt.window((2.5, 2.5, 4.5, 6.5), 10, 10), Some((2, 3, 5, 8)));
        assert_eq!(gt.window((-5.0, -5.0, 20.0, 20.0), 10, 10), Some((0, 0, 10, 10)));
        assert_eq!(gt.window((20.0, 20.0, 30.0, 30.0), 10, 10), None);
    }
}
