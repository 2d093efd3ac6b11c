//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Every band is decoded to `f64` on read, whatever its sample format on
/// disk.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

impl RasterElement for f64 {
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        if !self.is_finite() {
            return true;
        }
        match nodata {
            Some(nd) if nd.is_nan() => false,
            Some(nd) => (self - nd).abs() <= f64::EPSILON * nd.abs().max(1.0) * 100.0,
            None => false,
        }
    }
}
