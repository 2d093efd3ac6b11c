//! Ring patterns for nearest-cell searches

/// The cells at Chebyshev distance exactly `radius` from a center cell.
///
/// Radius 0 is the center itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring(pub usize);

impl Ring {
    pub fn radius(&self) -> usize {
        self.0
    }

    /// Relative positions on this ring, nearest first.
    ///
    /// Ordering is by squared Euclidean distance, then row offset, then
    /// column offset, so a search that stops at the first hit is
    /// deterministic.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        let mut offsets = Vec::with_capacity(8 * self.radius().max(1));

        for dr in -r..=r {
            for dc in -r..=r {
                if dr.abs().max(dc.abs()) == r {
                    offsets.push((dr, dc));
                }
            }
        }

        offsets.sort_by_key(|&(dr, dc)| (dr * dr + dc * dc, dr, dc));
        offsets
    }

    /// Absolute (row, col) positions of this ring around `center`
    /// that fall inside a `rows` x `cols` grid, nearest first.
    pub fn cells_around(
        &self,
        (row, col): (usize, usize),
        rows: usize,
        cols: usize,
    ) -> Vec<(usize, usize)> {
        self.offsets()
            .into_iter()
            .filter_map(|(dr, dc)| {
                let r = row as isize + dr;
                let c = col as isize + dc;
                (r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols)
                    .then_some((r as usize, c as usize))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_offsets() {
        let ring = Ring(1).offsets();
        assert_eq!(ring.len(), 8);
        // edge neighbours come before diagonals
        assert_eq!(&ring[..4], &[(-1, 0), (0, -1), (0, 1), (1, 0)]);

        assert_eq!(Ring(2).offsets().len(), 16);
        assert_eq!(Ring(0).offsets(), vec![(0, 0)]);
    }

    #[test]
    fn test_cells_around_clips_to_grid() {
        let cells = Ring(1).cells_around((0, 0), 5, 5);
        assert_eq!(cells, vec![(0, 1), (1, 0), (1, 1)]);
    }
}
