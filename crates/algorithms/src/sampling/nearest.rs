//! Nearest valid cell around a sector centroid

use super::{PixelSet, SampleMethod};
use geo::{BoundingRect, MultiPolygon};
use naia_core::raster::{Raster, Ring};

/// The cell under `centroid`, or the closest valid cell within `max_ring`
/// rings of it.
///
/// When the centroid falls off the grid but the sector still overlaps it,
/// the search starts from the grid cell closest to the centroid. A sector
/// with no overlap at all yields [`SampleMethod::Outside`].
pub fn nearest_cell<F>(
    geometry: &MultiPolygon<f64>,
    (cx, cy): (f64, f64),
    grid: &Raster<f64>,
    max_ring: usize,
    is_valid: F,
) -> PixelSet
where
    F: Fn(usize, usize) -> bool,
{
    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 {
        return PixelSet::outside();
    }

    let start = match grid.cell_at(cx, cy) {
        Some(cell) => cell,
        None => {
            let transform = grid.transform();
            let overlaps = geometry.bounding_rect().is_some_and(|r| {
                transform
                    .window((r.min().x, r.min().y, r.max().x, r.max().y), cols, rows)
                    .is_some()
            });
            if !overlaps {
                return PixelSet::outside();
            }
            let (col, row) = transform.geo_to_pixel(cx, cy);
            clamp_cell(row, col, rows, cols)
        }
    };

    for ring in 0..=max_ring {
        let hit = Ring(ring)
            .cells_around(start, rows, cols)
            .into_iter()
            .find(|&(r, c)| is_valid(r, c));
        if let Some(cell) = hit {
            return PixelSet {
                cells: vec![cell],
                covered: 1,
                method: SampleMethod::Nearest { ring },
            };
        }
    }

    PixelSet {
        cells: Vec::new(),
        covered: 1,
        method: SampleMethod::Nearest { ring: max_ring },
    }
}

fn clamp_cell(row: f64, col: f64, rows: usize, cols: usize) -> (usize, usize) {
    let clamp = |v: f64, n: usize| {
        if v.is_finite() {
            v.floor().clamp(0.0, (n - 1) as f64) as usize
        } else {
            0
        }
    };
    (clamp(row, rows), clamp(col, cols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use naia_core::GeoTransform;

    fn square(x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
                (x0, y0),
            ]),
            vec![],
        )])
    }

    /// 5x5 grid of 1° cells, lon 0..5, lat 0..5
    fn grid() -> Raster<f64> {
        let mut g = Raster::filled(5, 5, 10.0)
            .with_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0))
            .with_nodata(-1.0);
        g.set(2, 2, -1.0).unwrap();
        g
    }

    #[test]
    fn test_centroid_cell_valid() {
        let g = grid();
        let valid = |r, c| g.valid_value(r, c).is_some();
        let set = nearest_cell(&square(0.2, 4.2, 0.2), (0.3, 4.3), &g, 1, valid);
        assert_eq!(set.cells, vec![(0, 0)]);
        assert_eq!(set.method, SampleMethod::Nearest { ring: 0 });
    }

    #[test]
    fn test_ring_search_skips_nodata() {
        let g = grid();
        let valid = |r, c| g.valid_value(r, c).is_some();
        // centroid in cell (2, 2), which is no-data
        let set = nearest_cell(&square(2.4, 2.4, 0.2), (2.5, 2.5), &g, 1, valid);
        assert_eq!(set.method, SampleMethod::Nearest { ring: 1 });
        assert_eq!(set.cells, vec![(1, 2)]);
    }

    #[test]
    fn test_ring_exhausted() {
        let g = grid();
        let set = nearest_cell(&square(2.4, 2.4, 0.2), (2.5, 2.5), &g, 0, |r, c| {
            g.valid_value(r, c).is_some()
        });
        assert!(set.is_empty());
        assert_eq!(set.covered, 1);
        assert!(!set.is_outside());
    }

    #[test]
    fn test_centroid_off_grid_but_overlapping() {
        let g = grid();
        // sector straddles the eastern edge, centroid just outside
        let set = nearest_cell(&square(4.6, 2.1, 0.8), (5.0 + 1e-6, 2.5), &g, 1, |_, _| true);
        assert_eq!(set.cells, vec![(2, 4)]);
    }

    #[test]
    fn test_no_overlap() {
        let g = grid();
        let set = nearest_cell(&square(10.0, 10.0, 1.0), (10.5, 10.5), &g, 3, |_, _| true);
        assert!(set.is_outside());
    }
}
