//! Vegetation index from optical bands

use super::{measure, Measurement};
use crate::sampling::PixelSet;
use naia_core::raster::Raster;

/// Added to the NDVI denominator so dark pixels (NIR + Red = 0) stay finite
pub const NDVI_EPSILON: f64 = 1e-10;

/// Mean Normalized Difference Vegetation Index over a sector's pixels.
///
/// `NDVI = (NIR - Red) / (NIR + Red + ε)`
///
/// Per-pixel values outside [-1, 1] (negative reflectances, saturated
/// pixels) are discarded before averaging. If none survive, the sector's
/// NDVI is unavailable.
pub fn ndvi(red: &Raster<f64>, nir: &Raster<f64>, pixels: &PixelSet) -> Measurement {
    let values = pixels.cells.iter().filter_map(|&(row, col)| {
        let r = red.valid_value(row, col)?;
        let n = nir.valid_value(row, col)?;
        let v = (n - r) / (n + r + NDVI_EPSILON);
        (v.is_finite() && (-1.0..=1.0).contains(&v)).then_some(v)
    });
    measure(pixels, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Unavailable;
    use crate::sampling::SampleMethod;
    use approx::assert_relative_eq;

    fn all_cells(rows: usize, cols: usize) -> PixelSet {
        let cells: Vec<_> = (0..rows).flat_map(|r| (0..cols).map(move |c| (r, c))).collect();
        PixelSet {
            covered: cells.len(),
            cells,
            method: SampleMethod::Clip,
        }
    }

    #[test]
    fn test_uniform_ndvi() {
        let red = Raster::filled(10, 10, 0.1);
        let nir = Raster::filled(10, 10, 0.5);
        let m = ndvi(&red, &nir, &all_cells(10, 10));
        assert_relative_eq!(m.value().unwrap(), 0.4 / 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_equal_bands_give_zero() {
        let red = Raster::filled(4, 4, 0.3);
        let nir = Raster::filled(4, 4, 0.3);
        assert_eq!(ndvi(&red, &nir, &all_cells(4, 4)), Measurement::Value(0.0));

        let dark = Raster::filled(4, 4, 0.0);
        assert_eq!(ndvi(&dark, &dark, &all_cells(4, 4)), Measurement::Value(0.0));
    }

    #[test]
    fn test_out_of_range_pixels_dropped() {
        let mut red = Raster::filled(1, 2, 0.1);
        let nir = Raster::filled(1, 2, 0.5);
        // negative reflectance pushes NDVI above 1
        red.set(0, 1, -0.4).unwrap();
        let m = ndvi(&red, &nir, &all_cells(1, 2));
        assert_relative_eq!(m.value().unwrap(), 0.4 / 0.6, epsilon = 1e-9);

        red.set(0, 0, -0.4).unwrap();
        assert_eq!(
            ndvi(&red, &nir, &all_cells(1, 2)),
            Measurement::Unavailable(Unavailable::NonFinite)
        );
    }

    #[test]
    fn test_empty_set_unavailable() {
        let band = Raster::filled(2, 2, 0.2);
        let m = ndvi(&band, &band, &PixelSet::outside());
        assert_eq!(m, Measurement::Unavailable(Unavailable::NoCoverage));
    }
}
