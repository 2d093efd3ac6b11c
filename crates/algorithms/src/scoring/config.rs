//! Scoring configuration: reference ranges, weights, tier cutoffs

use crate::indicators::Indicator;
use naia_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Direction of a linear ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `low` maps to 0, `high` maps to 1
    Increasing,
    /// `low` maps to 1, `high` maps to 0
    Decreasing,
}

/// How one raw indicator maps onto [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReferenceRange {
    /// Linear ramp between `low` and `high`, clamped outside
    Linear {
        low: f64,
        high: f64,
        direction: Direction,
    },
    /// Optimal band `[low, high]` maps to 0; the contribution grows
    /// linearly with distance outside the band and reaches 1 at `tolerance`
    Band { low: f64, high: f64, tolerance: f64 },
}

impl ReferenceRange {
    fn validate(&self, indicator: Indicator) -> Result<()> {
        let (low, high, extra) = match *self {
            ReferenceRange::Linear { low, high, .. } => (low, high, None),
            ReferenceRange::Band {
                low,
                high,
                tolerance,
            } => (low, high, Some(tolerance)),
        };
        let ordered = if extra.is_some() { low <= high } else { low < high };
        if !low.is_finite() || !high.is_finite() || !ordered {
            return Err(Error::InvalidParameter {
                name: "reference_range",
                value: format!("{indicator}: [{low}, {high}]"),
                reason: "bounds must be finite with low below high".into(),
            });
        }
        if let Some(tol) = extra {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(Error::InvalidParameter {
                    name: "tolerance",
                    value: format!("{indicator}: {tol}"),
                    reason: "must be positive".into(),
                });
            }
        }
        Ok(())
    }
}

/// One reference range per indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceRanges {
    #[serde(default = "default_ndvi_range")]
    pub ndvi: ReferenceRange,
    #[serde(default = "default_vv_range")]
    pub vv_db: ReferenceRange,
    #[serde(default = "default_vh_range")]
    pub vh_db: ReferenceRange,
    #[serde(default = "default_temp_range")]
    pub temp_c: ReferenceRange,
    #[serde(default = "default_precip_range")]
    pub precip_mm: ReferenceRange,
}

// Increasing; `Weights::ndvi` is negative
fn default_ndvi_range() -> ReferenceRange {
    ReferenceRange::Linear {
        low: 0.0,
        high: 1.0,
        direction: Direction::Increasing,
    }
}

fn default_vv_range() -> ReferenceRange {
    ReferenceRange::Linear {
        low: -25.0,
        high: 0.0,
        direction: Direction::Increasing,
    }
}

fn default_vh_range() -> ReferenceRange {
    ReferenceRange::Linear {
        low: -30.0,
        high: -5.0,
        direction: Direction::Increasing,
    }
}

fn default_temp_range() -> ReferenceRange {
    ReferenceRange::Band {
        low: 20.0,
        high: 28.0,
        tolerance: 10.0,
    }
}

fn default_precip_range() -> ReferenceRange {
    ReferenceRange::Band {
        low: 60.0,
        high: 240.0,
        tolerance: 120.0,
    }
}

impl Default for ReferenceRanges {
    fn default() -> Self {
        Self {
            ndvi: default_ndvi_range(),
            vv_db: default_vv_range(),
            vh_db: default_vh_range(),
            temp_c: default_temp_range(),
            precip_mm: default_precip_range(),
        }
    }
}

impl ReferenceRanges {
    pub fn get(&self, indicator: Indicator) -> &ReferenceRange {
        match indicator {
            Indicator::Ndvi => &self.ndvi,
            Indicator::VvDb => &self.vv_db,
            Indicator::VhDb => &self.vh_db,
            Indicator::TempC => &self.temp_c,
            Indicator::PrecipMm => &self.precip_mm,
        }
    }
}

/// Signed weights of the composite score.
///
/// Every range normalizes so that a larger raw value gives a larger
/// contribution; the sign of the weight sets the direction of risk. NDVI and
/// VH carry negative weights, so more vegetation or cross-polarized
/// backscatter lowers the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Weights {
    #[serde(default = "default_w_precip")]
    pub precip_mm: f64,
    #[serde(default = "default_w_temp")]
    pub temp_c: f64,
    #[serde(default = "default_w_vv")]
    pub vv_db: f64,
    /// Negative: VH normalizes on an increasing ramp
    #[serde(default = "default_w_vh")]
    pub vh_db: f64,
    /// Negative: NDVI normalizes on an increasing ramp
    #[serde(default = "default_w_ndvi")]
    pub ndvi: f64,
}

fn default_w_precip() -> f64 {
    0.40
}
fn default_w_temp() -> f64 {
    0.35
}
fn default_w_vv() -> f64 {
    0.25
}
fn default_w_vh() -> f64 {
    -0.15
}
fn default_w_ndvi() -> f64 {
    -0.15
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            precip_mm: default_w_precip(),
            temp_c: default_w_temp(),
            vv_db: default_w_vv(),
            vh_db: default_w_vh(),
            ndvi: default_w_ndvi(),
        }
    }
}

impl Weights {
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

/// Batch percentile thresholds for the upper three tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierCutoffs {
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_critical")]
    pub critical: f64,
}

fn default_medium() -> f64 {
    0.40
}
fn default_high() -> f64 {
    0.70
}
fn default_critical() -> f64 {
    0.90
}

impl Default for TierCutoffs {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            high: default_high(),
            critical: default_critical(),
        }
    }
}

/// Everything the normalizer and aggregator need, passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub ranges: ReferenceRanges,
    /// Normalized contribution of an unavailable indicator
    #[serde(default = "default_fallback")]
    pub fallback: f64,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub cutoffs: TierCutoffs,
    /// Added to the composite score per detection in the sector
    #[serde(default = "default_amplification")]
    pub amplification_factor: f64,
}

fn default_fallback() -> f64 {
    0.0
}

fn default_amplification() -> f64 {
    0.2
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ranges: ReferenceRanges::default(),
            fallback: default_fallback(),
            weights: Weights::default(),
            cutoffs: TierCutoffs::default(),
            amplification_factor: default_amplification(),
        }
    }
}

impl ScoringConfig {
    /// Reject configurations that could push values outside their domains
    pub fn validate(&self) -> Result<()> {
        for indicator in Indicator::ALL {
            self.ranges.get(indicator).validate(indicator)?;
            let w = self.weights.get(indicator);
            if !w.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "weight",
                    value: format!("{indicator}: {w}"),
                    reason: "must be finite".into(),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.fallback) {
            return Err(Error::InvalidParameter {
                name: "fallback",
                value: self.fallback.to_string(),
                reason: "must lie in [0, 1]".into(),
            });
        }

        let c = &self.cutoffs;
        let ordered = 0.0 <= c.medium && c.medium <= c.high && c.high <= c.critical && c.critical <= 1.0;
        if !ordered {
            return Err(Error::InvalidParameter {
                name: "cutoffs",
                value: format!("{} / {} / {}", c.medium, c.high, c.critical),
                reason: "expected 0 <= medium <= high <= critical <= 1".into(),
            });
        }

        if !self.amplification_factor.is_finite() || self.amplification_factor < 0.0 {
            return Err(Error::InvalidParameter {
                name: "amplification_factor",
                value: self.amplification_factor.to_string(),
                reason: "must be finite and non-negative".into(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_weights() {
        let w = Weights::default();
        assert_eq!(
            (w.precip_mm, w.temp_c, w.vv_db, w.vh_db, w.ndvi),
            (0.40, 0.35, 0.25, -0.15, -0.15)
        );
    }

    #[test]
    fn test_invalid_configs() {
        let mut c = ScoringConfig::default();
        c.fallback = 1.5;
        assert!(c.validate().is_err());

        let mut c = ScoringConfig::default();
        c.cutoffs.high = 0.95;
        assert!(c.validate().is_err());

        let mut c = ScoringConfig::default();
        c.ranges.temp_c = ReferenceRange::Band {
            low: 20.0,
            high: 28.0,
            tolerance: 0.0,
        };
        assert!(c.validate().is_err());

        let mut c = ScoringConfig::default();
        c.ranges.ndvi = ReferenceRange::Linear {
            low: 1.0,
            high: 1.0,
            direction: Direction::Increasing,
        };
        assert!(c.validate().is_err());

        let mut c = ScoringConfig::default();
        c.weights.vv_db = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"fallback": 0.5, "weights": {"ndvi": -0.3}}"#;
        let c: ScoringConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.fallback, 0.5);
        assert_eq!(c.weights.ndvi, -0.3);
        assert_eq!(c.weights.precip_mm, 0.40);
        assert_eq!(c.cutoffs, TierCutoffs::default());
    }
}
