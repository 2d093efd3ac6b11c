//! Report files: JSON, CSV table and GeoJSON layer

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use naia_algorithms::report::SectorRow;
use naia_algorithms::Report;
use naia_core::io::{sector_feature, write_features};
use naia_core::SectorRegistry;

pub const REPORT_JSON: &str = "report.json";
pub const SECTORS_CSV: &str = "sectors.csv";
pub const SECTORS_GEOJSON: &str = "sectors.geojson";

pub fn write_json(report: &Report, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// One row per sector; unavailable indicators are empty cells
pub fn write_csv(report: &Report, path: &Path) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    for row in report.rows() {
        wtr.serialize(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Sector polygons carrying the flat row as properties
pub fn write_geojson(
    report: &Report,
    registry: &SectorRegistry,
    id_field: &str,
    path: &Path,
) -> Result<()> {
    let mut features = Vec::with_capacity(report.records.len());
    for record in &report.records {
        let Some(sector) = registry.get(&record.sector_id) else {
            continue;
        };
        let properties = match serde_json::to_value(SectorRow::from(record))? {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        features.push(sector_feature(sector, id_field, properties));
    }
    write_features(path, features).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Which files to write
#[derive(Debug, Clone, Copy)]
pub struct Outputs {
    pub json: bool,
    pub csv: bool,
    pub geojson: bool,
}

/// Write the selected report files into `dir`, returning their paths
pub fn write_all(
    report: &Report,
    registry: &SectorRegistry,
    id_field: &str,
    dir: &Path,
    outputs: Outputs,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    if outputs.json {
        let path = dir.join(REPORT_JSON);
        write_json(report, &path)?;
        written.push(path);
    }
    if outputs.csv {
        let path = dir.join(SECTORS_CSV);
        write_csv(report, &path)?;
        written.push(path);
    }
    if outputs.geojson {
        let path = dir.join(SECTORS_GEOJSON);
        write_geojson(report, registry, id_field, &path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use naia_algorithms::{run, PipelineParams, RasterInputs, ScalarSource};
    use naia_core::io::{read_sectors, SectorFields};
    use naia_core::{GeoTransform, Raster, RasterStack, Sector};

    fn scored() -> (Report, SectorRegistry) {
        let square = |id: &str, x0: f64| {
            let poly = Polygon::new(
                LineString::from(vec![
                    (x0, 0.0),
                    (x0 + 0.5, 0.0),
                    (x0 + 0.5, 0.5),
                    (x0, 0.5),
                    (x0, 0.0),
                ]),
                vec![],
            );
            Sector::from_polygon(id, poly).unwrap()
        };
        let registry = SectorRegistry::new(vec![square("a", 0.0), square("b", 5.0)]).unwrap();
        let grid = Raster::filled(10, 10, 298.15).with_transform(GeoTransform::new(0.0, 1.0, 0.1, -0.1));
        let inputs = RasterInputs {
            temperature: Some(ScalarSource::new(RasterStack::single(grid))),
            ..RasterInputs::default()
        };
        let report = run(&registry, &inputs, &[], &PipelineParams::default()).unwrap();
        (report, registry)
    }

    #[test]
    fn writes_all_three_files() {
        let (report, registry) = scored();
        let dir = tempfile::tempdir().unwrap();
        let outputs = Outputs {
            json: true,
            csv: true,
            geojson: true,
        };
        let written = write_all(&report, &registry, "CD_SETOR", dir.path(), outputs).unwrap();
        assert_eq!(written.len(), 3);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(REPORT_JSON)).unwrap()).unwrap();
        assert_eq!(json["records"].as_array().unwrap().len(), 2);

        let mut rdr = csv::Reader::from_path(dir.path().join(SECTORS_CSV)).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(&headers[0], "sector_id");
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        // unavailable ndvi is an empty cell
        assert_eq!(&rows[0][1], "");

        let sectors = read_sectors(dir.path().join(SECTORS_GEOJSON), &SectorFields::default()).unwrap();
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors[0].id(), "a");
    }
}
