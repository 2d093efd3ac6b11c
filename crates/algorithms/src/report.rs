//! Per-sector records and the batch summary

use crate::detections::{Assignment, Detection, DetectionJoin};
use crate::indicators::{Indicator, SectorIndicators};
use crate::scoring::{NormalizedIndicators, RiskTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final result for one sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub sector_id: String,
    pub area_km2: f64,
    pub indicators: SectorIndicators,
    pub normalized: NormalizedIndicators,
    pub composite_score: f64,
    /// Position of the score within the batch, 0 lowest and 1 highest
    pub percentile: f64,
    pub risk_tier: RiskTier,
    /// Composite score rescaled to 0–100 over the batch
    pub risk_percentage: f64,
    pub pool_count: usize,
    pub amplified_score: f64,
    /// Unavailable indicators and geometry problems, human readable
    pub issues: Vec<String>,
}

/// Batch-level problems that did not abort the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchWarning {
    /// No sector overlaps the raster; likely a wrong bounding box upstream
    NoOverlap { source: String },
    /// The raster could not be used at all
    SourceFailed { source: String, reason: String },
}

impl fmt::Display for BatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchWarning::NoOverlap { source } => {
                write!(f, "{source} raster does not overlap any sector")
            }
            BatchWarning::SourceFailed { source, reason } => {
                write!(f, "{source} raster unusable: {reason}")
            }
        }
    }
}

/// Availability and averages of one indicator across the batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub available: usize,
    pub mean: Option<f64>,
    pub area_weighted_mean: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionTotals {
    pub total: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub below_confidence: usize,
}

/// Aggregates over the whole batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub sector_count: usize,
    /// Every tier is present, zero included
    pub tier_counts: BTreeMap<RiskTier, usize>,
    pub indicators: BTreeMap<Indicator, IndicatorSummary>,
    pub composite: ScoreStats,
    pub detections: DetectionTotals,
}

impl BatchSummary {
    pub fn from_records(records: &[RiskRecord], join: &DetectionJoin) -> Self {
        let mut tier_counts: BTreeMap<RiskTier, usize> =
            RiskTier::ALL.iter().map(|&t| (t, 0)).collect();
        for r in records {
            *tier_counts.entry(r.risk_tier).or_insert(0) += 1;
        }

        let indicators = Indicator::ALL
            .iter()
            .map(|&i| (i, summarize_indicator(records, i)))
            .collect();

        let composite = if records.is_empty() {
            ScoreStats::default()
        } else {
            let scores = records.iter().map(|r| r.composite_score);
            ScoreStats {
                min: scores.clone().fold(f64::INFINITY, f64::min),
                max: scores.clone().fold(f64::NEG_INFINITY, f64::max),
                mean: scores.sum::<f64>() / records.len() as f64,
            }
        };

        Self {
            sector_count: records.len(),
            tier_counts,
            indicators,
            composite,
            detections: DetectionTotals {
                total: join.total(),
                assigned: join.assigned(),
                unassigned: join.unassigned,
                below_confidence: join.below_confidence,
            },
        }
    }

    pub fn tier_count(&self, tier: RiskTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }
}

fn summarize_indicator(records: &[RiskRecord], indicator: Indicator) -> IndicatorSummary {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut weighted = 0.0;
    let mut area = 0.0;

    for r in records {
        let Some(v) = r.indicators.get(indicator).value() else {
            continue;
        };
        count += 1;
        sum += v;
        if r.area_km2.is_finite() && r.area_km2 > 0.0 {
            weighted += v * r.area_km2;
            area += r.area_km2;
        }
    }

    IndicatorSummary {
        available: count,
        mean: (count > 0).then(|| sum / count as f64),
        area_weighted_mean: (area > 0.0).then(|| weighted / area),
    }
}

/// A detection and the bucket it was assigned to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedDetection {
    #[serde(flatten)]
    pub detection: Detection,
    pub assignment: Assignment,
}

/// Everything a scoring run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// One record per sector, in ascending sector id order
    pub records: Vec<RiskRecord>,
    pub summary: BatchSummary,
    pub warnings: Vec<BatchWarning>,
    /// Every input detection, including the unassigned ones
    pub detections: Vec<AssignedDetection>,
}

impl Report {
    pub fn record(&self, sector_id: &str) -> Option<&RiskRecord> {
        self.records
            .binary_search_by(|r| r.sector_id.as_str().cmp(sector_id))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Flat rows for tabular output
    pub fn rows(&self) -> Vec<SectorRow> {
        self.records.iter().map(SectorRow::from).collect()
    }
}

/// One flat table row: `{sector_id, indicators…, composite_score, risk_tier, pool_count, …}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorRow {
    pub sector_id: String,
    pub ndvi: Option<f64>,
    pub vv_db: Option<f64>,
    pub vh_db: Option<f64>,
    pub temp_c: Option<f64>,
    pub precip_mm: Option<f64>,
    pub composite_score: f64,
    pub risk_tier: RiskTier,
    pub pool_count: usize,
    pub risk_percentage: f64,
    pub amplified_score: f64,
    pub area_km2: f64,
    pub issues: String,
}

impl From<&RiskRecord> for SectorRow {
    fn from(r: &RiskRecord) -> Self {
        Self {
            sector_id: r.sector_id.clone(),
            ndvi: r.indicators.ndvi.value(),
            vv_db: r.indicators.vv_db.value(),
            vh_db: r.indicators.vh_db.value(),
            temp_c: r.indicators.temp_c.value(),
            precip_mm: r.indicators.precip_mm.value(),
            composite_score: r.composite_score,
            risk_tier: r.risk_tier,
            pool_count: r.pool_count,
            risk_percentage: r.risk_percentage,
            amplified_score: r.amplified_score,
            area_km2: r.area_km2,
            issues: r.issues.join("; "),
        }
    }
}
