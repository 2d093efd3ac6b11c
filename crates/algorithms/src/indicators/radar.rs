//! SAR backscatter in decibels

use super::{measure, Measurement};
use crate::sampling::PixelSet;
use naia_core::raster::Raster;

/// Mean backscatter of one polarization, in dB.
///
/// Each linear value is converted with `10 * log10(v)` before averaging.
/// Non-positive values have no logarithm and are skipped.
pub fn backscatter_db(band: &Raster<f64>, pixels: &PixelSet) -> Measurement {
    let values = pixels
        .values(band)
        .filter(|&v| v > 0.0)
        .map(|v| 10.0 * v.log10());
    measure(pixels, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Unavailable;
    use crate::sampling::SampleMethod;
    use approx::assert_relative_eq;

    fn cells(list: &[(usize, usize)]) -> PixelSet {
        PixelSet {
            cells: list.to_vec(),
            covered: list.len(),
            method: SampleMethod::Clip,
        }
    }

    #[test]
    fn test_unit_backscatter_is_zero_db() {
        let band = Raster::filled(3, 3, 1.0);
        let m = backscatter_db(&band, &cells(&[(0, 0), (1, 1), (2, 2)]));
        assert_eq!(m, Measurement::Value(0.0));
    }

    #[test]
    fn test_mean_is_taken_in_db() {
        let mut band = Raster::filled(1, 2, 0.1);
        band.set(0, 1, 0.001).unwrap();
        // -10 dB and -30 dB
        let m = backscatter_db(&band, &cells(&[(0, 0), (0, 1)]));
        assert_relative_eq!(m.value().unwrap(), -20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_positive_skipped() {
        let mut band = Raster::filled(1, 3, 0.01);
        band.set(0, 1, 0.0).unwrap();
        band.set(0, 2, -0.5).unwrap();
        let m = backscatter_db(&band, &cells(&[(0, 0), (0, 1), (0, 2)]));
        assert_relative_eq!(m.value().unwrap(), -20.0, epsilon = 1e-9);

        let zeros = Raster::filled(1, 2, 0.0);
        assert_eq!(
            backscatter_db(&zeros, &cells(&[(0, 0), (0, 1)])),
            Measurement::Unavailable(Unavailable::NonFinite)
        );
    }
}
