//! Batch-relative risk tiers
//!
//! Tiers depend on where a sector's score falls among the batch's scores,
//! not on its absolute value: the same composite score can land in
//! different tiers in different runs. Each run therefore flags roughly a
//! fixed share of sectors, and its highest scorer is always in the top tier.

use super::config::TierCutoffs;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Ordinal risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    #[serde(rename = "Baixo")]
    Baixo,
    #[serde(rename = "Médio")]
    Medio,
    #[serde(rename = "Alto")]
    Alto,
    #[serde(rename = "Crítico")]
    Critico,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Baixo,
        RiskTier::Medio,
        RiskTier::Alto,
        RiskTier::Critico,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Baixo => "Baixo",
            RiskTier::Medio => "Médio",
            RiskTier::Alto => "Alto",
            RiskTier::Critico => "Crítico",
        }
    }

    /// Tier for a percentile in [0, 1]
    pub fn from_percentile(percentile: f64, cutoffs: &TierCutoffs) -> Self {
        if percentile >= cutoffs.critical {
            RiskTier::Critico
        } else if percentile >= cutoffs.high {
            RiskTier::Alto
        } else if percentile >= cutoffs.medium {
            RiskTier::Medio
        } else {
            RiskTier::Baixo
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rank-based classification of one sector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Position of the score in the batch, 0 for the lowest and 1 for the highest
    pub percentile: f64,
    pub tier: RiskTier,
}

/// Classify a batch of composite scores.
///
/// A score at sorted position `k` (0-based) of `n` gets percentile
/// `k / (n - 1)`, so a sector sits at or above the batch's `q` quantile
/// exactly when its percentile is at least `q`. Equal scores all take the
/// highest position of their group and therefore share a tier. The highest
/// score always reaches 1.0, including in a batch of one. The result is
/// aligned with the input.
pub fn classify(scores: &[f64], cutoffs: &TierCutoffs) -> Vec<Classification> {
    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut result = vec![
        Classification {
            percentile: 0.0,
            tier: RiskTier::Baixo,
        };
        n
    ];
    let mut start = 0;
    while start < n {
        let score = scores[order[start]];
        let end = order[start..]
            .iter()
            .position(|&i| scores[i].total_cmp(&score) != Ordering::Equal)
            .map_or(n, |len| start + len);

        let percentile = if n > 1 {
            (end - 1) as f64 / (n - 1) as f64
        } else {
            1.0
        };
        let tier = RiskTier::from_percentile(percentile, cutoffs);
        for &i in &order[start..end] {
            result[i] = Classification { percentile, tier };
        }
        start = end;
    }
    result
}

/// Rescale scores to 0–100 over the batch's observed range.
///
/// A batch whose scores are all equal maps every sector to 50.
pub fn risk_percentages(scores: &[f64]) -> Vec<f64> {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    scores
        .iter()
        .map(|&s| {
            if span > 0.0 && span.is_finite() {
                (s - min) / span * 100.0
            } else {
                50.0
            }
        })
        .collect()
}
