//! Point detections joined to sectors
//!
//! Every input detection ends in exactly one bucket: a sector, the
//! unassigned bucket (outside every sector), or the below-confidence bucket.

mod tile;

use naia_core::vector::SectorRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use tile::TileFrame;

/// A geolocated detection from an external classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub lon: f64,
    pub lat: f64,
    pub confidence: f64,
}

impl Detection {
    pub fn new(lon: f64, lat: f64, confidence: f64) -> Self {
        Self {
            lon,
            lat,
            confidence,
        }
    }
}

/// Parameters for [`join`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinParams {
    /// Detections below this confidence are set aside. 0 disables the filter.
    #[serde(default)]
    pub min_confidence: f64,
}

impl Default for JoinParams {
    fn default() -> Self {
        Self { min_confidence: 0.0 }
    }
}

/// Where one detection ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "bucket", content = "sector_id")]
pub enum Assignment {
    Sector(String),
    Unassigned,
    BelowConfidence,
}

/// Result of joining detections to sectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionJoin {
    /// Count per sector id; every registry sector is present, zero included
    pub counts: BTreeMap<String, usize>,
    /// One entry per input detection, in input order
    pub assignments: Vec<Assignment>,
    pub unassigned: usize,
    pub below_confidence: usize,
}

impl DetectionJoin {
    pub fn total(&self) -> usize {
        self.assignments.len()
    }

    pub fn assigned(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count_for(&self, sector_id: &str) -> usize {
        self.counts.get(sector_id).copied().unwrap_or(0)
    }
}

/// Assign each detection to the sector containing it.
///
/// Boundary points go to the lowest sector id among the touching polygons.
/// Non-finite coordinates are unassigned.
pub fn join(detections: &[Detection], registry: &SectorRegistry, params: &JoinParams) -> DetectionJoin {
    let mut result = DetectionJoin {
        counts: registry.iter().map(|s| (s.id().to_string(), 0)).collect(),
        assignments: Vec::with_capacity(detections.len()),
        unassigned: 0,
        below_confidence: 0,
    };

    for d in detections {
        let assignment = if params.min_confidence > 0.0 && !(d.confidence >= params.min_confidence) {
            result.below_confidence += 1;
            Assignment::BelowConfidence
        } else if let Some(sector) = registry.locate(d.lon, d.lat) {
            if let Some(count) = result.counts.get_mut(sector.id()) {
                *count += 1;
            }
            Assignment::Sector(sector.id().to_string())
        } else {
            result.unassigned += 1;
            Assignment::Unassigned
        };
        result.assignments.push(assignment);
    }

    tracing::debug!(
        "Joined {} detections: {} assigned, {} unassigned, {} below confidence",
        result.total(),
        result.assigned(),
        result.unassigned,
        result.below_confidence
    );

    result
}
