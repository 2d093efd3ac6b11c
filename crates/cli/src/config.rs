//! TOML run configuration for `naia score`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use naia_algorithms::detections::TileFrame;
use naia_algorithms::indicators::{PrecipitationUnit, TemperatureUnit};
use naia_algorithms::sampling::SamplerParams;
use naia_algorithms::scoring::ScoringConfig;
use naia_algorithms::PipelineParams;
use naia_core::io::{SectorFields, DEFAULT_AREA_FIELD, DEFAULT_ID_FIELD};

/// Top-level run configuration.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub sectors: SectorsToml,

    /// Keep only sectors intersecting this square.
    #[serde(default)]
    pub study_area: Option<StudyAreaToml>,

    #[serde(default)]
    pub optical: Option<OpticalToml>,

    #[serde(default)]
    pub radar: Option<RadarToml>,

    #[serde(default)]
    pub temperature: Option<ScalarToml<TemperatureUnit>>,

    #[serde(default)]
    pub precipitation: Option<ScalarToml<PrecipitationUnit>>,

    #[serde(default)]
    pub detections: Option<DetectionsToml>,

    #[serde(default)]
    pub sampling: SamplerParams,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub output: OutputToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectorsToml {
    pub path: PathBuf,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Property with a precomputed area; computed from the geometry otherwise.
    #[serde(default = "default_area_field")]
    pub area_field: Option<String>,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}
fn default_area_field() -> Option<String> {
    Some(DEFAULT_AREA_FIELD.to_string())
}

impl SectorsToml {
    pub fn fields(&self) -> SectorFields {
        SectorFields {
            id_field: self.id_field.clone(),
            area_field: self.area_field.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyAreaToml {
    pub center_lat: f64,
    pub center_lon: f64,
    #[serde(default = "default_size_km")]
    pub size_km: f64,
}

fn default_size_km() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpticalToml {
    pub path: PathBuf,
    #[serde(default)]
    pub red_band: usize,
    #[serde(default = "default_nir_band")]
    pub nir_band: usize,
}

fn default_nir_band() -> usize {
    3
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadarToml {
    pub path: PathBuf,
    #[serde(default)]
    pub vv_band: usize,
    #[serde(default = "default_vh_band")]
    pub vh_band: usize,
}

fn default_vh_band() -> usize {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScalarToml<U> {
    pub path: PathBuf,
    #[serde(default)]
    pub band: usize,
    #[serde(default)]
    pub unit: U,
}

/// How detection positions are expressed in the CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionFormat {
    /// `lon,lat[,confidence]`
    #[default]
    Geographic,
    /// `x,y[,confidence]` pixel centres inside one map tile
    TilePixel,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionsToml {
    pub path: PathBuf,
    #[serde(default)]
    pub format: DetectionFormat,
    /// Required for `tile_pixel`
    #[serde(default)]
    pub tile: Option<TileFrame>,
    #[serde(default)]
    pub min_confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_true")]
    pub json: bool,
    #[serde(default = "default_true")]
    pub csv: bool,
    #[serde(default = "default_true")]
    pub geojson: bool,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            json: true,
            csv: true,
            geojson: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("naia-output")
}
fn default_true() -> bool {
    true
}

impl RunConfig {
    /// Read and parse a run file, resolving relative paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: RunConfig =
            toml::from_str(&toml_str).context("failed to parse TOML config")?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }

        if let Some(d) = &config.detections {
            if d.format == DetectionFormat::TilePixel && d.tile.is_none() {
                anyhow::bail!("[detections] format = \"tile_pixel\" requires a [detections.tile] table");
            }
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        resolve(&mut self.sectors.path);
        if let Some(o) = &mut self.optical {
            resolve(&mut o.path);
        }
        if let Some(r) = &mut self.radar {
            resolve(&mut r.path);
        }
        if let Some(t) = &mut self.temperature {
            resolve(&mut t.path);
        }
        if let Some(p) = &mut self.precipitation {
            resolve(&mut p.path);
        }
        if let Some(d) = &mut self.detections {
            resolve(&mut d.path);
        }
        resolve(&mut self.output.dir);
    }

    pub fn has_rasters(&self) -> bool {
        self.optical.is_some()
            || self.radar.is_some()
            || self.temperature.is_some()
            || self.precipitation.is_some()
    }

    pub fn pipeline_params(&self) -> PipelineParams {
        let mut params = PipelineParams {
            sampler: self.sampling,
            scoring: self.scoring,
            ..PipelineParams::default()
        };
        if let Some(d) = &self.detections {
            params.join.min_confidence = d.min_confidence;
        }
        params
    }
}
