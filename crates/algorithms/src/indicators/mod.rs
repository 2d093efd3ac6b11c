//! Per-sector environmental indicators
//!
//! Every calculator returns a [`Measurement`]: either a finite value or an
//! explicit reason why the sector has none. A sector with no valid pixels
//! is never reported as a zero reading.

mod climate;
mod optical;
mod radar;

use crate::sampling::PixelSet;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use climate::{precipitation_mm, temperature_c, PrecipitationUnit, TemperatureUnit};
pub use optical::{ndvi, NDVI_EPSILON};
pub use radar::backscatter_db;

/// The indicators computed for every sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Normalized difference vegetation index
    Ndvi,
    /// VV backscatter, dB
    VvDb,
    /// VH backscatter, dB
    VhDb,
    /// Air temperature, °C
    TempC,
    /// Precipitation, mm
    PrecipMm,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::Ndvi,
        Indicator::VvDb,
        Indicator::VhDb,
        Indicator::TempC,
        Indicator::PrecipMm,
    ];

    /// Column name used in tables and reports
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Ndvi => "ndvi",
            Indicator::VvDb => "vv_db",
            Indicator::VhDb => "vh_db",
            Indicator::TempC => "temp_c",
            Indicator::PrecipMm => "precip_mm",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an indicator has no value for a sector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// No raster was supplied for this indicator
    NotProvided,
    /// The sector does not overlap the raster
    NoCoverage,
    /// The sector overlaps the raster but every pixel is no-data
    NoValidPixels,
    /// Pixels were valid but none produced a usable value
    NonFinite,
    /// The sector geometry could not be sampled (degenerate or failed reprojection)
    Geometry(String),
    /// The raster source itself is unusable (e.g. a missing band)
    Source(String),
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::NotProvided => f.write_str("not provided"),
            Unavailable::NoCoverage => f.write_str("no raster coverage"),
            Unavailable::NoValidPixels => f.write_str("no valid pixels"),
            Unavailable::NonFinite => f.write_str("no usable values"),
            Unavailable::Geometry(msg) => write!(f, "geometry error: {msg}"),
            Unavailable::Source(msg) => write!(f, "source error: {msg}"),
        }
    }
}

/// A raw indicator reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    Value(f64),
    Unavailable(Unavailable),
}

impl Measurement {
    /// Wrap a computed value, rejecting non-finite results
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Measurement::Value(value)
        } else {
            Measurement::Unavailable(Unavailable::NonFinite)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Value(v) => Some(*v),
            Measurement::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Measurement::Value(_))
    }

    pub fn reason(&self) -> Option<&Unavailable> {
        match self {
            Measurement::Value(_) => None,
            Measurement::Unavailable(reason) => Some(reason),
        }
    }
}

impl Default for Measurement {
    fn default() -> Self {
        Measurement::Unavailable(Unavailable::NotProvided)
    }
}

/// Raw indicator readings for one sector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorIndicators {
    pub ndvi: Measurement,
    pub vv_db: Measurement,
    pub vh_db: Measurement,
    pub temp_c: Measurement,
    pub precip_mm: Measurement,
}

impl SectorIndicators {
    /// Every indicator unavailable for the same reason
    pub fn unavailable(reason: Unavailable) -> Self {
        let m = Measurement::Unavailable(reason);
        Self {
            ndvi: m.clone(),
            vv_db: m.clone(),
            vh_db: m.clone(),
            temp_c: m.clone(),
            precip_mm: m,
        }
    }

    pub fn get(&self, indicator: Indicator) -> &Measurement {
        match indicator {
            Indicator::Ndvi => &self.ndvi,
            Indicator::VvDb => &self.vv_db,
            Indicator::VhDb => &self.vh_db,
            Indicator::TempC => &self.temp_c,
            Indicator::PrecipMm => &self.precip_mm,
        }
    }

    pub fn set(&mut self, indicator: Indicator, measurement: Measurement) {
        let slot = match indicator {
            Indicator::Ndvi => &mut self.ndvi,
            Indicator::VvDb => &mut self.vv_db,
            Indicator::VhDb => &mut self.vh_db,
            Indicator::TempC => &mut self.temp_c,
            Indicator::PrecipMm => &mut self.precip_mm,
        };
        *slot = measurement;
    }

    /// (indicator, measurement) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &Measurement)> {
        Indicator::ALL.into_iter().map(move |i| (i, self.get(i)))
    }

    pub fn available_count(&self) -> usize {
        self.iter().filter(|(_, m)| m.is_available()).count()
    }
}

/// Reason to report when a pixel set yields nothing to average
pub(crate) fn empty_reason(pixels: &PixelSet) -> Unavailable {
    if pixels.is_outside() || pixels.covered == 0 {
        Unavailable::NoCoverage
    } else {
        Unavailable::NoValidPixels
    }
}

/// Mean of finite values, `None` when there are none
pub(crate) fn finite_mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Shared tail of every calculator: empty set, then mean, then finiteness
pub(crate) fn measure<I: IntoIterator<Item = f64>>(pixels: &PixelSet, values: I) -> Measurement {
    if pixels.is_empty() {
        return Measurement::Unavailable(empty_reason(pixels));
    }
    match finite_mean(values) {
        Some(mean) => Measurement::from_value(mean),
        None => Measurement::Unavailable(Unavailable::NonFinite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::SampleMethod;

    #[test]
    fn test_measurement_serializes_untagged() {
        let json = serde_json::to_string(&Measurement::Value(1.5)).unwrap();
        assert_eq!(json, "1.5");
        let json = serde_json::to_string(&Measurement::Unavailable(Unavailable::NoCoverage)).unwrap();
        assert_eq!(json, "\"no_coverage\"");
    }

    #[test]
    fn test_from_value_rejects_non_finite() {
        assert_eq!(Measurement::from_value(0.0), Measurement::Value(0.0));
        assert!(!Measurement::from_value(f64::NAN).is_available());
        assert!(!Measurement::from_value(f64::INFINITY).is_available());
    }

    #[test]
    fn test_sector_indicators_get_set() {
        let mut s = SectorIndicators::default();
        assert_eq!(s.available_count(), 0);
        s.set(Indicator::TempC, Measurement::Value(25.0));
        assert_eq!(s.get(Indicator::TempC).value(), Some(25.0));
        assert_eq!(s.available_count(), 1);
        assert_eq!(s.get(Indicator::Ndvi).reason(), Some(&Unavailable::NotProvided));
    }

    #[test]
    fn test_empty_reason() {
        assert_eq!(empty_reason(&PixelSet::outside()), Unavailable::NoCoverage);
        let covered = PixelSet {
            cells: vec![],
            covered: 4,
            method: SampleMethod::Clip,
        };
        assert_eq!(empty_reason(&covered), Unavailable::NoValidPixels);
    }
}
