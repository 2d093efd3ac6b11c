//! Normalization, weighted aggregation and batch classification

mod aggregate;
mod classify;
mod config;
mod normalize;

pub use aggregate::{amplified_score, baseline_score, composite_score};
pub use classify::{classify, risk_percentages, Classification, RiskTier};
pub use config::{Direction, ReferenceRange, ReferenceRanges, ScoringConfig, TierCutoffs, Weights};
pub use normalize::{normalize, NormalizedIndicators};
