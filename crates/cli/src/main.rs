//! NAIA CLI - sector risk scoring from satellite, climate and detection inputs

mod config;
mod detections;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use naia_algorithms::scoring::RiskTier;
use naia_algorithms::{
    run, OpticalSource, RadarSource, RasterInputs, Report, ScalarSource,
};
use naia_core::io::{read_geotiff, read_sectors, sector_feature, write_features, SectorFields};
use naia_core::{BoundingBox, RasterStack, SectorRegistry};

use crate::config::RunConfig;
use crate::detections::read_detections;
use crate::output::{write_all, Outputs};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "naia")]
#[command(author, version, about = "Sector-level environmental risk scoring", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Select the sectors intersecting a square study area
    StudyArea {
        /// Centre latitude (degrees)
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Centre longitude (degrees)
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Side length in kilometres
        #[arg(long, default_value = "1.0")]
        size_km: f64,
        /// Input sector GeoJSON
        #[arg(long)]
        sectors: PathBuf,
        /// Property holding the sector id
        #[arg(long, default_value = naia_core::io::DEFAULT_ID_FIELD)]
        id_field: String,
        /// Output GeoJSON
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Score every sector and write the report
    Score {
        /// Run configuration (TOML)
        #[arg(short, long, default_value = "naia.toml")]
        config: PathBuf,
        /// Override the output directory from the configuration
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default_filter = ["naia", "naia_core", "naia_algorithms"]
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_stack(path: &Path, label: &str) -> Result<RasterStack> {
    let pb = spinner(&format!("Reading {label} raster..."));
    let stack = read_geotiff(path)
        .with_context(|| format!("Failed to read {label} raster {}", path.display()))?;
    pb.finish_and_clear();
    let (rows, cols) = stack.shape();
    info!("{}: {} x {}, {} band(s)", label, cols, rows, stack.count());
    Ok(stack)
}

fn read_registry(path: &Path, fields: &SectorFields) -> Result<SectorRegistry> {
    let pb = spinner("Reading sectors...");
    let sectors = read_sectors(path, fields)
        .with_context(|| format!("Failed to read sectors {}", path.display()))?;
    pb.finish_and_clear();
    let registry = SectorRegistry::new(sectors).context("Invalid sector set")?;
    info!("Sectors: {}", registry.len());
    Ok(registry)
}

fn restrict(registry: SectorRegistry, bbox: &BoundingBox) -> Result<SectorRegistry> {
    let selected: Vec<_> = registry.within(bbox).into_iter().cloned().collect();
    info!("Study area keeps {} of {} sectors", selected.len(), registry.len());
    SectorRegistry::new(selected).context("No sector intersects the study area")
}

fn load_inputs(config: &RunConfig) -> Result<RasterInputs> {
    let mut inputs = RasterInputs::default();

    if let Some(o) = &config.optical {
        inputs.optical =
            Some(OpticalSource::new(read_stack(&o.path, "optical")?).with_bands(o.red_band, o.nir_band));
    }
    if let Some(r) = &config.radar {
        inputs.radar =
            Some(RadarSource::new(read_stack(&r.path, "radar")?).with_bands(r.vv_band, r.vh_band));
    }
    if let Some(t) = &config.temperature {
        inputs.temperature = Some(
            ScalarSource::new(read_stack(&t.path, "temperature")?)
                .with_band(t.band)
                .with_unit(t.unit),
        );
    }
    if let Some(p) = &config.precipitation {
        inputs.precipitation = Some(
            ScalarSource::new(read_stack(&p.path, "precipitation")?)
                .with_band(p.band)
                .with_unit(p.unit),
        );
    }
    Ok(inputs)
}

fn print_summary(report: &Report) {
    let summary = &report.summary;
    let n = summary.sector_count.max(1) as f64;

    println!("\nRisk tiers ({} sectors):", summary.sector_count);
    for tier in RiskTier::ALL.iter().rev() {
        let count = summary.tier_count(*tier);
        println!("  {:<8} {:>6} ({:.1}%)", tier.label(), count, 100.0 * count as f64 / n);
    }

    println!("\nComposite score:");
    println!("  Min:  {:.4}", summary.composite.min);
    println!("  Mean: {:.4}", summary.composite.mean);
    println!("  Max:  {:.4}", summary.composite.max);

    println!("\nIndicators:");
    for (indicator, s) in &summary.indicators {
        match s.mean {
            Some(mean) => println!(
                "  {:<10} mean {:>10.4}  ({} of {} sectors)",
                indicator.name(),
                mean,
                s.available,
                summary.sector_count
            ),
            None => println!("  {:<10} unavailable", indicator.name()),
        }
    }

    let d = &summary.detections;
    if d.total > 0 {
        println!(
            "\nDetections: {} total, {} assigned, {} unassigned, {} below confidence",
            d.total, d.assigned, d.unassigned, d.below_confidence
        );
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

fn info_cmd(input: &Path) -> Result<()> {
    let stack = read_stack(input, "input")?;
    let band = stack.band(0).context("Raster has no bands")?;
    let (rows, cols) = band.shape();
    let bounds = band.bounds();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, band.len());
    println!("Bands: {}", stack.count());
    println!("Cell size: {}", band.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = band.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = band.nodata() {
        println!("NoData: {}", nodata);
    }

    for (i, band) in stack.bands().iter().enumerate() {
        let stats = band.statistics();
        println!("\nBand {} statistics:", i);
        if let Some(min) = stats.min {
            println!("  Min: {:.4}", min);
        }
        if let Some(max) = stats.max {
            println!("  Max: {:.4}", max);
        }
        if let Some(mean) = stats.mean {
            println!("  Mean: {:.4}", mean);
        }
        println!(
            "  Valid cells: {} ({:.1}%)",
            stats.valid_count,
            100.0 * stats.valid_count as f64 / band.len().max(1) as f64
        );
    }
    Ok(())
}

fn study_area_cmd(
    lat: f64,
    lon: f64,
    size_km: f64,
    sectors: &Path,
    id_field: &str,
    output: &Path,
) -> Result<()> {
    let bbox = BoundingBox::around(lat, lon, size_km).context("Invalid study area")?;
    let fields = SectorFields {
        id_field: id_field.to_string(),
        ..SectorFields::default()
    };
    let registry = read_registry(sectors, &fields)?;

    let selected = registry.within(&bbox);
    let features = selected
        .iter()
        .map(|s| {
            let mut props = serde_json::Map::new();
            props.insert("AREA_KM2".to_string(), serde_json::Value::from(s.area_km2()));
            sector_feature(s, id_field, props)
        })
        .collect();
    write_features(output, features)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let [min_lon, min_lat, max_lon, max_lat] = bbox.to_array();
    println!(
        "Study area: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        min_lon, min_lat, max_lon, max_lat
    );
    println!("{} of {} sectors saved to: {}", selected.len(), registry.len(), output.display());
    Ok(())
}

fn score_cmd(config_path: &Path, out_dir: Option<PathBuf>) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    if !config.has_rasters() {
        anyhow::bail!(
            "{} configures no raster source ([optical], [radar], [temperature] or [precipitation])",
            config_path.display()
        );
    }

    let mut registry = read_registry(&config.sectors.path, &config.sectors.fields())?;
    if let Some(area) = &config.study_area {
        let bbox = BoundingBox::around(area.center_lat, area.center_lon, area.size_km)
            .context("Invalid [study_area]")?;
        registry = restrict(registry, &bbox)?;
    }

    let inputs = load_inputs(&config)?;
    let detections = match &config.detections {
        Some(d) => read_detections(&d.path, d.format, d.tile.as_ref())?,
        None => Vec::new(),
    };
    let params = config.pipeline_params();

    let start = Instant::now();
    let pb = spinner("Scoring sectors...");
    let report = run(&registry, &inputs, &detections, &params).context("Scoring failed")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    for w in &report.warnings {
        warn!("{}", w);
    }

    let dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
    let outputs = Outputs {
        json: config.output.json,
        csv: config.output.csv,
        geojson: config.output.geojson,
    };
    let written = write_all(&report, &registry, &config.sectors.id_field, &dir, outputs)?;

    print_summary(&report);
    println!();
    for path in &written {
        println!("Saved: {}", path.display());
    }
    println!("  Processing time: {:.2?}", elapsed);
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => info_cmd(&input),
        Commands::StudyArea {
            lat,
            lon,
            size_km,
            sectors,
            id_field,
            output,
        } => study_area_cmd(lat, lon, size_km, &sectors, &id_field, &output),
        Commands::Score { config, out_dir } => score_cmd(&config, out_dir),
    }
}
