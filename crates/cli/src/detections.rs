//! Detection CSV input

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use naia_algorithms::detections::{Detection, TileFrame};

use crate::config::DetectionFormat;

fn default_confidence() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct GeoRow {
    lon: f64,
    lat: f64,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct PixelRow {
    x: f64,
    y: f64,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

/// Read detections from a CSV file with a header row
pub fn read_detections(
    path: &Path,
    format: DetectionFormat,
    tile: Option<&TileFrame>,
) -> Result<Vec<Detection>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open detections {}", path.display()))?;
    parse_detections(file, format, tile)
        .with_context(|| format!("failed to parse detections {}", path.display()))
}

pub fn parse_detections<R: Read>(
    reader: R,
    format: DetectionFormat,
    tile: Option<&TileFrame>,
) -> Result<Vec<Detection>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    match format {
        DetectionFormat::Geographic => rdr
            .deserialize::<GeoRow>()
            .map(|row| -> Result<Detection> {
                let row = row?;
                Ok(Detection::new(row.lon, row.lat, row.confidence))
            })
            .collect(),
        DetectionFormat::TilePixel => {
            let tile = tile.context("tile_pixel detections need a tile frame")?;
            rdr.deserialize::<PixelRow>()
                .map(|row| -> Result<Detection> {
                    let row = row?;
                    let (lon, lat) = tile.pixel_to_lonlat(row.x, row.y);
                    Ok(Detection::new(lon, lat, row.confidence))
                })
                .collect()
        }
    }
}
