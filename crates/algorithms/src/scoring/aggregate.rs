//! Weighted composite score

use super::config::{ScoringConfig, Weights};
use super::normalize::NormalizedIndicators;
use crate::indicators::Indicator;

/// Weighted sum of normalized indicators.
///
/// With the default weights:
/// `0.40·precip + 0.35·temp + 0.25·vv − 0.15·vh − 0.15·ndvi`
pub fn composite_score(normalized: &NormalizedIndicators, weights: &Weights) -> f64 {
    Indicator::ALL
        .iter()
        .map(|&i| weights.get(i) * normalized.get(i))
        .sum()
}

/// Score of a sector whose indicators are all unavailable
pub fn baseline_score(config: &ScoringConfig) -> f64 {
    let all_fallback = NormalizedIndicators {
        ndvi: config.fallback,
        vv_db: config.fallback,
        vh_db: config.fallback,
        temp_c: config.fallback,
        precip_mm: config.fallback,
    };
    composite_score(&all_fallback, &config.weights)
}

/// Composite score raised by nearby detections
pub fn amplified_score(composite: f64, pool_count: usize, factor: f64) -> f64 {
    composite + pool_count as f64 * factor
}
