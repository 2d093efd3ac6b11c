//! Benchmarks for the batch scoring pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{LineString, Polygon};
use naia_algorithms::detections::Detection;
use naia_algorithms::{run, OpticalSource, PipelineParams, RadarSource, RasterInputs, ScalarSource};
use naia_core::{GeoTransform, Raster, RasterStack, Sector, SectorRegistry};

const GRID: usize = 512;

fn create_band(seed: usize) -> Raster<f64> {
    let mut band = Raster::new(GRID, GRID);
    band.set_transform(GeoTransform::new(0.0, 1.0, 1.0 / GRID as f64, -1.0 / GRID as f64));

    for row in 0..GRID {
        for col in 0..GRID {
            let variation = ((row * 7 + col * 13 + seed) % 100) as f64 / 100.0;
            band.set(row, col, 0.05 + variation * 0.5).unwrap();
        }
    }
    band
}

/// `side × side` square sectors tiling the unit square
fn create_registry(side: usize) -> SectorRegistry {
    let step = 1.0 / side as f64;
    let mut sectors = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            let (x0, y0) = (i as f64 * step, j as f64 * step);
            let poly = Polygon::new(
                LineString::from(vec![
                    (x0, y0),
                    (x0 + step, y0),
                    (x0 + step, y0 + step),
                    (x0, y0 + step),
                    (x0, y0),
                ]),
                vec![],
            );
            sectors.push(Sector::from_polygon(format!("{i:03}{j:03}"), poly).unwrap());
        }
    }
    SectorRegistry::new(sectors).unwrap()
}

fn create_inputs() -> RasterInputs {
    let optical = RasterStack::new((0..4).map(create_band).collect()).unwrap();
    let radar = RasterStack::new(vec![create_band(11), create_band(17)]).unwrap();
    RasterInputs {
        optical: Some(OpticalSource::new(optical)),
        radar: Some(RadarSource::new(radar)),
        temperature: Some(ScalarSource::new(RasterStack::single(create_band(23)))),
        precipitation: Some(ScalarSource::new(RasterStack::single(create_band(29)))),
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let inputs = create_inputs();
    let detections: Vec<Detection> = (0..1000)
        .map(|i| Detection::new((i % 97) as f64 / 97.0, (i % 89) as f64 / 89.0, 0.9))
        .collect();

    for side in [8, 16, 32].iter() {
        let registry = create_registry(*side);

        group.bench_with_input(BenchmarkId::from_parameter(side * side), side, |b, _| {
            b.iter(|| {
                run(
                    black_box(&registry),
                    black_box(&inputs),
                    black_box(&detections),
                    &PipelineParams::default(),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
