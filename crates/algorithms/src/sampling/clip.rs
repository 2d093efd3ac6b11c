//! Polygon clipping by pixel centre

use super::{PixelSet, SampleMethod};
use geo::{BoundingRect, Contains, MultiPolygon, Point};
use naia_core::GeoTransform;

/// Cells of a `rows` x `cols` grid whose centre lies inside `geometry`.
///
/// `geometry` must already be in the grid's CRS. Only the window spanned by
/// the polygon's bounding box is scanned.
pub fn clip_cells<F>(
    geometry: &MultiPolygon<f64>,
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
    is_valid: F,
) -> PixelSet
where
    F: Fn(usize, usize) -> bool,
{
    let Some(rect) = geometry.bounding_rect() else {
        return PixelSet::outside();
    };
    let bounds = (rect.min().x, rect.min().y, rect.max().x, rect.max().y);
    let Some((c0, r0, c1, r1)) = transform.window(bounds, cols, rows) else {
        return PixelSet::outside();
    };

    let mut cells = Vec::new();
    let mut covered = 0;

    for row in r0..r1 {
        for col in c0..c1 {
            let (x, y) = transform.pixel_to_geo(col, row);
            if !geometry.contains(&Point::new(x, y)) {
                continue;
            }
            covered += 1;
            if is_valid(row, col) {
                cells.push((row, col));
            }
        }
    }

    PixelSet {
        cells,
        covered,
        method: SampleMethod::Clip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    #[test]
    fn test_clip_follows_polygon_not_bbox() {
        // right triangle over a 4x4 unit grid, lower-left half
        let tri = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)]),
            vec![],
        );
        let mp = MultiPolygon(vec![tri]);
        let gt = GeoTransform::new(0.0, 4.0, 1.0, -1.0);

        let set = clip_cells(&mp, &gt, 4, 4, |_, _| true);

        // centres (x+0.5, y+0.5) with x + y + 1 < 4
        assert_eq!(set.covered, 6);
        assert!(set.cells.contains(&(3, 0)));
        assert!(!set.cells.contains(&(0, 3)));
    }

    #[test]
    fn test_clip_filters_invalid() {
        let sq = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]),
            vec![],
        );
        let gt = GeoTransform::new(0.0, 2.0, 1.0, -1.0);
        let set = clip_cells(&MultiPolygon(vec![sq]), &gt, 2, 2, |row, _| row == 0);
        assert_eq!(set.covered, 4);
        assert_eq!(set.cells, vec![(0, 0), (0, 1)]);
    }
}
