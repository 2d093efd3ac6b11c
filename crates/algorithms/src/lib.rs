//! # NAIA Algorithms
//!
//! Sector-level feature aggregation and risk scoring.
//!
//! ## Stages
//!
//! - **sampling**: pixels covered by a sector, or the nearest valid cell on coarse grids
//! - **indicators**: NDVI, radar backscatter (dB), temperature and precipitation per sector
//! - **scoring**: normalization against reference ranges, weighted composite, batch tiers
//! - **detections**: point detections joined to the sector containing them
//! - **pipeline**: the batch run that ties the stages into a [`Report`]

mod maybe_rayon;

pub mod detections;
pub mod indicators;
pub mod pipeline;
pub mod report;
pub mod sampling;
pub mod scoring;

pub use pipeline::{run, OpticalSource, PipelineParams, RadarSource, RasterInputs, ScalarSource};
pub use report::{BatchSummary, BatchWarning, Report, RiskRecord};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::detections::{join, Detection, DetectionJoin, JoinParams, TileFrame};
    pub use crate::indicators::{Indicator, Measurement, SectorIndicators, Unavailable};
    pub use crate::pipeline::{
        run, OpticalSource, PipelineParams, RadarSource, RasterInputs, ScalarSource,
    };
    pub use crate::report::{BatchSummary, BatchWarning, Report, RiskRecord};
    pub use crate::sampling::{sample, PixelSet, SampleMethod, SamplerParams, SamplingMethod};
    pub use crate::scoring::{
        classify, composite_score, normalize, NormalizedIndicators, ReferenceRange, RiskTier,
        ScoringConfig,
    };
    pub use naia_core::prelude::*;
}
