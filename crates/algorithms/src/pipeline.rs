//! Batch scoring run
//!
//! Takes the sector registry, whichever rasters are available and the point
//! detections, and produces one [`RiskRecord`] per sector. Only structural
//! problems (no rasters at all, invalid parameters) abort the run; anything
//! that goes wrong for a single sector or a single raster is recorded in
//! the report.

use crate::detections::{join, Detection, JoinParams};
use crate::indicators::{
    backscatter_db, ndvi, precipitation_mm, temperature_c, Indicator, Measurement,
    PrecipitationUnit, SectorIndicators, TemperatureUnit, Unavailable,
};
use crate::maybe_rayon::*;
use crate::report::{AssignedDetection, BatchSummary, BatchWarning, Report, RiskRecord};
use crate::sampling::{sample, SamplerParams};
use crate::scoring::{
    amplified_score, classify, composite_score, risk_percentages, NormalizedIndicators,
    ScoringConfig,
};
use naia_core::raster::{Raster, RasterStack};
use naia_core::vector::{Sector, SectorRegistry};
use naia_core::{Error, Projection, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Multispectral raster used for NDVI
#[derive(Debug, Clone)]
pub struct OpticalSource {
    pub stack: RasterStack,
    pub red_band: usize,
    pub nir_band: usize,
}

impl OpticalSource {
    /// Band order R, G, B, NIR
    pub fn new(stack: RasterStack) -> Self {
        Self {
            stack,
            red_band: 0,
            nir_band: 3,
        }
    }

    pub fn with_bands(mut self, red_band: usize, nir_band: usize) -> Self {
        self.red_band = red_band;
        self.nir_band = nir_band;
        self
    }
}

/// SAR raster with linear-power VV and VH bands
#[derive(Debug, Clone)]
pub struct RadarSource {
    pub stack: RasterStack,
    pub vv_band: usize,
    pub vh_band: usize,
}

impl RadarSource {
    pub fn new(stack: RasterStack) -> Self {
        Self {
            stack,
            vv_band: 0,
            vh_band: 1,
        }
    }

    pub fn with_bands(mut self, vv_band: usize, vh_band: usize) -> Self {
        self.vv_band = vv_band;
        self.vh_band = vh_band;
        self
    }
}

/// Single-band climate raster and the unit its values are stored in
#[derive(Debug, Clone)]
pub struct ScalarSource<U> {
    pub stack: RasterStack,
    pub band: usize,
    pub unit: U,
}

impl<U: Default> ScalarSource<U> {
    pub fn new(stack: RasterStack) -> Self {
        Self {
            stack,
            band: 0,
            unit: U::default(),
        }
    }
}

impl<U> ScalarSource<U> {
    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    pub fn with_unit(mut self, unit: U) -> Self {
        self.unit = unit;
        self
    }
}

/// The rasters available for a run; any subset may be missing
#[derive(Debug, Clone, Default)]
pub struct RasterInputs {
    pub optical: Option<OpticalSource>,
    pub radar: Option<RadarSource>,
    pub temperature: Option<ScalarSource<TemperatureUnit>>,
    pub precipitation: Option<ScalarSource<PrecipitationUnit>>,
}

impl RasterInputs {
    pub fn is_empty(&self) -> bool {
        self.optical.is_none()
            && self.radar.is_none()
            && self.temperature.is_none()
            && self.precipitation.is_none()
    }
}

/// Parameters for [`run`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineParams {
    #[serde(default)]
    pub sampler: SamplerParams,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub join: JoinParams,
}

impl PipelineParams {
    pub fn validate(&self) -> Result<()> {
        self.sampler.validate()?;
        self.scoring.validate()?;
        let min = self.join.min_confidence;
        if !min.is_finite() || min < 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_confidence",
                value: min.to_string(),
                reason: "must be a non-negative number".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Channels: one indicator read from one raster
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Kernel<'a> {
    Ndvi {
        red: &'a Raster<f64>,
        nir: &'a Raster<f64>,
    },
    Backscatter(&'a Raster<f64>),
    Temperature(&'a Raster<f64>, TemperatureUnit),
    Precipitation(&'a Raster<f64>, PrecipitationUnit),
}

struct Channel<'a> {
    indicator: Indicator,
    source: &'static str,
    stack: &'a RasterStack,
    bands: Vec<usize>,
    /// Projection and bands, or the reason every sector is unavailable
    state: std::result::Result<(Projection, Kernel<'a>), Unavailable>,
}

impl Channel<'_> {
    /// Measure one sector; the flag is set when the sector lies outside the raster
    fn measure(&self, sector: &Sector, sampler: &SamplerParams) -> (Measurement, bool) {
        let (projection, kernel) = match &self.state {
            Ok(ready) => *ready,
            Err(reason) => return (Measurement::Unavailable(reason.clone()), false),
        };

        let pixels = match sample(self.stack, &self.bands, sector, projection, sampler) {
            Ok(pixels) => pixels,
            Err(e) => {
                return (
                    Measurement::Unavailable(Unavailable::Geometry(e.to_string())),
                    false,
                )
            }
        };

        let measurement = match kernel {
            Kernel::Ndvi { red, nir } => ndvi(red, nir, &pixels),
            Kernel::Backscatter(band) => backscatter_db(band, &pixels),
            Kernel::Temperature(band, unit) => temperature_c(band, &pixels, unit),
            Kernel::Precipitation(band, unit) => precipitation_mm(band, &pixels, unit),
        };
        (measurement, pixels.is_outside())
    }

    fn is_ready(&self) -> bool {
        self.state.is_ok()
    }
}

/// Projection from WGS84 into the stack's CRS; untagged rasters are taken as geographic
fn resolve_projection(stack: &RasterStack) -> Result<Projection> {
    match stack.crs() {
        Some(crs) => crs.projection(),
        None => Ok(Projection::Geographic),
    }
}

fn push_warning(warnings: &mut Vec<BatchWarning>, warning: BatchWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

fn prepare<'a>(
    indicator: Indicator,
    source: &'static str,
    stack: &'a RasterStack,
    bands: Vec<usize>,
    make: impl FnOnce(&[&'a Raster<f64>]) -> Kernel<'a>,
    warnings: &mut Vec<BatchWarning>,
) -> Channel<'a> {
    let layers = bands
        .iter()
        .map(|&b| stack.band(b))
        .collect::<Result<Vec<_>>>();

    let state = match layers {
        Err(e) => {
            tracing::warn!("{} raster cannot provide {}: {}", source, indicator, e);
            push_warning(
                warnings,
                BatchWarning::SourceFailed {
                    source: source.to_string(),
                    reason: e.to_string(),
                },
            );
            Err(Unavailable::Source(e.to_string()))
        }
        Ok(layers) => match resolve_projection(stack) {
            Ok(projection) => Ok((projection, make(&layers))),
            Err(e) => {
                tracing::warn!("{} raster cannot be reprojected: {}", source, e);
                push_warning(
                    warnings,
                    BatchWarning::SourceFailed {
                        source: source.to_string(),
                        reason: e.to_string(),
                    },
                );
                Err(Unavailable::Geometry(e.to_string()))
            }
        },
    };

    Channel {
        indicator,
        source,
        stack,
        bands,
        state,
    }
}

fn channels<'a>(inputs: &'a RasterInputs, warnings: &mut Vec<BatchWarning>) -> Vec<Channel<'a>> {
    let mut out = Vec::new();

    if let Some(optical) = &inputs.optical {
        out.push(prepare(
            Indicator::Ndvi,
            "optical",
            &optical.stack,
            vec![optical.red_band, optical.nir_band],
            |l| Kernel::Ndvi {
                red: l[0],
                nir: l[1],
            },
            warnings,
        ));
    }

    // VV and VH are sampled separately so that no-data in one band does not
    // discard the other.
    if let Some(radar) = &inputs.radar {
        out.push(prepare(
            Indicator::VvDb,
            "radar",
            &radar.stack,
            vec![radar.vv_band],
            |l| Kernel::Backscatter(l[0]),
            warnings,
        ));
        out.push(prepare(
            Indicator::VhDb,
            "radar",
            &radar.stack,
            vec![radar.vh_band],
            |l| Kernel::Backscatter(l[0]),
            warnings,
        ));
    }

    if let Some(temperature) = &inputs.temperature {
        let unit = temperature.unit;
        out.push(prepare(
            Indicator::TempC,
            "temperature",
            &temperature.stack,
            vec![temperature.band],
            |l| Kernel::Temperature(l[0], unit),
            warnings,
        ));
    }

    if let Some(precipitation) = &inputs.precipitation {
        let unit = precipitation.unit;
        out.push(prepare(
            Indicator::PrecipMm,
            "precipitation",
            &precipitation.stack,
            vec![precipitation.band],
            |l| Kernel::Precipitation(l[0], unit),
            warnings,
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Per-sector evaluation
// ---------------------------------------------------------------------------

struct SectorOutcome {
    indicators: SectorIndicators,
    /// One flag per channel
    outside: Vec<bool>,
}

fn evaluate(sector: &Sector, channels: &[Channel<'_>], sampler: &SamplerParams) -> SectorOutcome {
    let mut indicators = SectorIndicators::default();
    let mut outside = Vec::with_capacity(channels.len());

    for channel in channels {
        let (measurement, off_grid) = channel.measure(sector, sampler);
        indicators.set(channel.indicator, measurement);
        outside.push(off_grid);
    }

    SectorOutcome {
        indicators,
        outside,
    }
}

fn issues(indicators: &SectorIndicators) -> Vec<String> {
    indicators
        .iter()
        .filter_map(|(indicator, m)| match m.reason() {
            None | Some(Unavailable::NotProvided) => None,
            Some(reason) => Some(format!("{indicator}: {reason}")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Score every sector in `registry`.
///
/// Records come back in ascending sector id order. Each sector is evaluated
/// independently of the others; only classification and the risk percentage
/// look at the batch as a whole.
///
/// # Errors
///
/// - [`Error::NoRasterInputs`] when `inputs` holds no raster at all
/// - [`Error::InvalidParameter`] when `params` fails validation
pub fn run(
    registry: &SectorRegistry,
    inputs: &RasterInputs,
    detections: &[Detection],
    params: &PipelineParams,
) -> Result<Report> {
    if registry.is_empty() {
        return Err(Error::EmptySectorSet);
    }
    if inputs.is_empty() {
        return Err(Error::NoRasterInputs);
    }
    params.validate()?;

    let mut warnings = Vec::new();
    let channels = channels(inputs, &mut warnings);
    let sectors = registry.sectors();

    tracing::info!(
        "Scoring {} sectors from {} indicator channel(s)",
        sectors.len(),
        channels.len()
    );

    // ---- Indicators ----
    let outcomes: Vec<SectorOutcome> = sectors
        .into_par_iter()
        .map(|sector| evaluate(sector, &channels, &params.sampler))
        .collect();

    for (j, channel) in channels.iter().enumerate() {
        if channel.is_ready() && outcomes.iter().all(|o| o.outside[j]) {
            tracing::warn!(
                "{} raster does not overlap any sector ({})",
                channel.source,
                channel.indicator
            );
            push_warning(
                &mut warnings,
                BatchWarning::NoOverlap {
                    source: channel.source.to_string(),
                },
            );
        }
    }

    // ---- Scores ----
    let normalized: Vec<NormalizedIndicators> = outcomes
        .iter()
        .map(|o| NormalizedIndicators::from_raw(&o.indicators, &params.scoring))
        .collect();
    let scores: Vec<f64> = normalized
        .iter()
        .map(|n| composite_score(n, &params.scoring.weights))
        .collect();

    let classes = classify(&scores, &params.scoring.cutoffs);
    let percentages = risk_percentages(&scores);

    // ---- Detections ----
    let joined = join(detections, registry, &params.join);

    let records: Vec<RiskRecord> = sectors
        .iter()
        .zip(outcomes)
        .zip(normalized)
        .enumerate()
        .map(|(i, ((sector, outcome), normalized))| {
            let pool_count = joined.count_for(sector.id());
            RiskRecord {
                sector_id: sector.id().to_string(),
                area_km2: sector.area_km2(),
                issues: issues(&outcome.indicators),
                indicators: outcome.indicators,
                normalized,
                composite_score: scores[i],
                percentile: classes[i].percentile,
                risk_tier: classes[i].tier,
                risk_percentage: percentages[i],
                pool_count,
                amplified_score: amplified_score(
                    scores[i],
                    pool_count,
                    params.scoring.amplification_factor,
                ),
            }
        })
        .collect();

    let summary = BatchSummary::from_records(&records, &joined);
    let detections = detections
        .iter()
        .zip(&joined.assignments)
        .map(|(d, a)| AssignedDetection {
            detection: *d,
            assignment: a.clone(),
        })
        .collect();

    tracing::info!(
        "Scored {} sectors: {} warning(s), {} of {} detections assigned",
        records.len(),
        warnings.len(),
        joined.assigned(),
        joined.total()
    );

    Ok(Report {
        records,
        summary,
        warnings,
        detections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use naia_core::{GeoTransform, CRS};

    fn square(id: &str, x0: f64, y0: f64) -> Sector {
        let poly = Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + 0.5, y0),
                (x0 + 0.5, y0 + 0.5),
                (x0, y0 + 0.5),
                (x0, y0),
            ]),
            vec![],
        );
        Sector::from_polygon(id, poly).unwrap()
    }

    fn registry() -> SectorRegistry {
        SectorRegistry::new(vec![square("b", 0.5, 0.0), square("a", 0.0, 0.0)]).unwrap()
    }

    /// 10x10 grid of 0.1° cells over lon 0..1, lat 0..1
    fn grid(fill: f64) -> Raster<f64> {
        Raster::filled(10, 10, fill).with_transform(GeoTransform::new(0.0, 1.0, 0.1, -0.1))
    }

    fn temperature_only(fill: f64) -> RasterInputs {
        RasterInputs {
            temperature: Some(ScalarSource::new(RasterStack::single(grid(fill)))),
            ..RasterInputs::default()
        }
    }

    #[test]
    fn test_no_rasters_is_fatal() {
        let result = run(&registry(), &RasterInputs::default(), &[], &PipelineParams::default());
        assert!(matches!(result, Err(Error::NoRasterInputs)));
    }

    #[test]
    fn test_invalid_params_are_fatal() {
        let mut params = PipelineParams::default();
        params.join.min_confidence = -1.0;
        let result = run(&registry(), &temperature_only(298.15), &[], &params);
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_records_sorted_and_missing_sources_not_provided() {
        let report = run(&registry(), &temperature_only(298.15), &[], &PipelineParams::default()).unwrap();

        let ids: Vec<_> = report.records.iter().map(|r| r.sector_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let a = report.record("a").unwrap();
        let temp = a.indicators.temp_c.value().unwrap();
        assert!((temp - 25.0).abs() < 1e-9);
        assert_eq!(a.indicators.ndvi.reason(), Some(&Unavailable::NotProvided));
        assert!(a.issues.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_band_marks_source_failed() {
        let inputs = RasterInputs {
            radar: Some(RadarSource::new(RasterStack::single(grid(0.1)))),
            ..RasterInputs::default()
        };
        let report = run(&registry(), &inputs, &[], &PipelineParams::default()).unwrap();

        let a = report.record("a").unwrap();
        assert!(a.indicators.vv_db.is_available());
        assert!(matches!(a.indicators.vh_db.reason(), Some(Unavailable::Source(_))));
        assert!(matches!(report.warnings[0], BatchWarning::SourceFailed { .. }));
    }

    #[test]
    fn test_unsupported_crs_is_geometry_error() {
        let stack = RasterStack::single(grid(298.15)).with_crs(CRS::from_epsg(2154));
        let inputs = RasterInputs {
            temperature: Some(ScalarSource::new(stack)),
            ..RasterInputs::default()
        };
        let report = run(&registry(), &inputs, &[], &PipelineParams::default()).unwrap();

        for record in &report.records {
            assert!(matches!(record.indicators.temp_c.reason(), Some(Unavailable::Geometry(_))));
            assert_eq!(record.issues.len(), 1);
        }
    }

    #[test]
    fn test_disjoint_raster_warns_no_overlap() {
        let far = Raster::filled(10, 10, 298.15).with_transform(GeoTransform::new(50.0, 51.0, 0.1, -0.1));
        let inputs = RasterInputs {
            temperature: Some(ScalarSource::new(RasterStack::single(far))),
            ..RasterInputs::default()
        };
        let report = run(&registry(), &inputs, &[], &PipelineParams::default()).unwrap();

        assert_eq!(
            report.warnings,
            vec![BatchWarning::NoOverlap {
                source: "temperature".into()
            }]
        );
        for record in &report.records {
            assert_eq!(record.indicators.temp_c.reason(), Some(&Unavailable::NoCoverage));
        }
    }

    #[test]
    fn test_detections_counted_and_amplified() {
        let detections = [
            Detection::new(0.25, 0.25, 0.9),
            Detection::new(0.3, 0.2, 0.9),
            Detection::new(7.0, 7.0, 0.9),
        ];
        let report = run(&registry(), &temperature_only(298.15), &detections, &PipelineParams::default()).unwrap();

        let a = report.record("a").unwrap();
        assert_eq!(a.pool_count, 2);
        assert!((a.amplified_score - (a.composite_score + 0.4)).abs() < 1e-12);
        assert_eq!(report.summary.detections.unassigned, 1);
        assert_eq!(report.detections.len(), 3);
    }
}
