//! Temperature and precipitation from reanalysis grids

use super::{measure, Measurement};
use crate::sampling::PixelSet;
use naia_core::raster::Raster;
use serde::{Deserialize, Serialize};

const KELVIN_OFFSET: f64 = 273.15;

/// Unit of a temperature raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// ERA5 `t2m` convention
    #[default]
    Kelvin,
    Celsius,
}

impl TemperatureUnit {
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => value - KELVIN_OFFSET,
            TemperatureUnit::Celsius => value,
        }
    }
}

/// Unit of a precipitation raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationUnit {
    /// ERA5 `tp` convention (metres of water)
    #[default]
    Metres,
    Millimetres,
}

impl PrecipitationUnit {
    pub fn to_millimetres(self, value: f64) -> f64 {
        match self {
            PrecipitationUnit::Metres => value * 1000.0,
            PrecipitationUnit::Millimetres => value,
        }
    }
}

/// Sector temperature in °C
pub fn temperature_c(band: &Raster<f64>, pixels: &PixelSet, unit: TemperatureUnit) -> Measurement {
    measure(pixels, pixels.values(band).map(|v| unit.to_celsius(v)))
}

/// Sector precipitation in mm
pub fn precipitation_mm(
    band: &Raster<f64>,
    pixels: &PixelSet,
    unit: PrecipitationUnit,
) -> Measurement {
    measure(pixels, pixels.values(band).map(|v| unit.to_millimetres(v)))
}
