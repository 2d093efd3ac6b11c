//! Raw indicator → [0, 1] risk contribution

use super::config::{Direction, ReferenceRange, ScoringConfig};
use crate::indicators::{Indicator, Measurement, SectorIndicators};
use serde::{Deserialize, Serialize};

impl ReferenceRange {
    /// Map a raw value onto [0, 1].
    ///
    /// Infinite inputs clamp to the nearest extreme. NaN has no position on
    /// the ramp and returns `None`.
    pub fn normalize(&self, raw: f64) -> Option<f64> {
        if raw.is_nan() {
            return None;
        }
        let t = match *self {
            ReferenceRange::Linear {
                low,
                high,
                direction,
            } => {
                let t = ((raw - low) / (high - low)).clamp(0.0, 1.0);
                match direction {
                    Direction::Increasing => t,
                    Direction::Decreasing => 1.0 - t,
                }
            }
            ReferenceRange::Band {
                low,
                high,
                tolerance,
            } => {
                let distance = if raw < low {
                    low - raw
                } else if raw > high {
                    raw - high
                } else {
                    0.0
                };
                (distance / tolerance).clamp(0.0, 1.0)
            }
        };
        Some(t)
    }
}

/// Normalize one measurement, substituting the configured fallback when it
/// is unavailable.
///
/// The result never encodes whether the indicator raises or lowers risk;
/// that is the sign of its entry in [`Weights`](super::Weights).
pub fn normalize(indicator: Indicator, measurement: &Measurement, config: &ScoringConfig) -> f64 {
    measurement
        .value()
        .and_then(|raw| config.ranges.get(indicator).normalize(raw))
        .unwrap_or(config.fallback)
}

/// Normalized contributions for one sector, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIndicators {
    pub ndvi: f64,
    pub vv_db: f64,
    pub vh_db: f64,
    pub temp_c: f64,
    pub precip_mm: f64,
}

impl NormalizedIndicators {
    /// Normalize every indicator of a sector
    pub fn from_raw(raw: &SectorIndicators, config: &ScoringConfig) -> Self {
        Self {
            ndvi: normalize(Indicator::Ndvi, &raw.ndvi, config),
            vv_db: normalize(Indicator::VvDb, &raw.vv_db, config),
            vh_db: normalize(Indicator::VhDb, &raw.vh_db, config),
            temp_c: normalize(Indicator::TempC, &raw.temp_c, config),
            precip_mm: normalize(Indicator::PrecipMm, &raw.precip_mm, config),
        }
    }

    pub fn get(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Ndvi => self.ndvi,
            Indicator::VvDb => self.vv_db,
            Indicator::VhDb => self.vh_db,
            Indicator::TempC => self.temp_c,
            Indicator::PrecipMm => self.precip_mm,
        }
    }
}
