//! In-memory sector set with an R-tree for point lookups

use crate::error::{Error, Result};
use crate::vector::{BoundingBox, Sector};
use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};
use std::collections::HashSet;

/// Envelope of one sector, pointing back into the registry's sector list.
struct SectorEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for SectorEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// The set of sector polygons for one analysis run.
///
/// Sectors are kept sorted by id, so iteration order (and therefore report
/// order) is stable regardless of the source order.
pub struct SectorRegistry {
    sectors: Vec<Sector>,
    index: RTree<SectorEntry>,
}

impl SectorRegistry {
    /// Build a registry from loaded sectors.
    ///
    /// Fails with [`Error::EmptySectorSet`] when `sectors` is empty and with
    /// [`Error::DuplicateSector`] when two sectors share an id.
    pub fn new(mut sectors: Vec<Sector>) -> Result<Self> {
        if sectors.is_empty() {
            return Err(Error::EmptySectorSet);
        }

        let mut seen = HashSet::with_capacity(sectors.len());
        for sector in &sectors {
            if !seen.insert(sector.id()) {
                return Err(Error::DuplicateSector(sector.id().to_string()));
            }
        }

        sectors.sort_by(|a, b| a.id().cmp(b.id()));

        let entries = sectors
            .iter()
            .enumerate()
            .map(|(index, sector)| SectorEntry {
                index,
                envelope: compute_envelope(sector.geometry()),
            })
            .collect();

        tracing::debug!("Indexed {} sectors", sectors.len());

        Ok(Self {
            sectors,
            index: RTree::bulk_load(entries),
        })
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Sectors in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Look up a sector by id
    pub fn get(&self, id: &str) -> Option<&Sector> {
        self.sectors
            .binary_search_by(|s| s.id().cmp(id))
            .ok()
            .map(|i| &self.sectors[i])
    }

    /// Find the sector containing a geographic point.
    ///
    /// Points on a shared boundary belong to every adjacent closed polygon;
    /// the lowest sector id among them wins. Non-finite coordinates match
    /// nothing.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&Sector> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let point = Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        self.index
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| self.sectors[entry.index].geometry().intersects(&point))
            .map(|entry| entry.index)
            .min()
            .map(|i| &self.sectors[i])
    }

    /// Sectors whose geometry intersects `bbox`, in id order.
    pub fn within(&self, bbox: &BoundingBox) -> Vec<&Sector> {
        let rect = bbox.to_polygon();
        let mut hits: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&bbox.envelope())
            .filter(|entry| self.sectors[entry.index].geometry().intersects(&rect))
            .map(|entry| entry.index)
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.sectors[i]).collect()
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square(id: &str, x0: f64, y0: f64, side: f64) -> Sector {
        let poly = Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
                (x0, y0),
            ]),
            vec![],
        );
        Sector::from_polygon(id, poly).unwrap()
    }

    fn grid() -> SectorRegistry {
        // b | c
        // a | d
        SectorRegistry::new(vec![
            square("d", 1.0, 0.0, 1.0),
            square("a", 0.0, 0.0, 1.0),
            square("c", 1.0, 1.0, 1.0),
            square("b", 0.0, 1.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_registry_sorted_and_lookup() {
        let registry = grid();
        let ids: Vec<_> = registry.iter().map(Sector::id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(registry.get("c").map(Sector::id), Some("c"));
        assert!(registry.get("z").is_none());
    }

    #[test]
    fn test_locate_interior_and_outside() {
        let registry = grid();
        assert_eq!(registry.locate(0.5, 0.5).map(Sector::id), Some("a"));
        assert_eq!(registry.locate(1.5, 1.5).map(Sector::id), Some("c"));
        assert!(registry.locate(5.0, 5.0).is_none());
        assert!(registry.locate(f64::NAN, 0.5).is_none());
    }

    #[test]
    fn test_locate_boundary_prefers_lowest_id() {
        let registry = grid();
        // shared edge between c and d
        assert_eq!(registry.locate(1.5, 1.0).map(Sector::id), Some("c"));
        // corner shared by all four
        assert_eq!(registry.locate(1.0, 1.0).map(Sector::id), Some("a"));
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(matches!(SectorRegistry::new(vec![]), Err(Error::EmptySectorSet)));
        let dup = SectorRegistry::new(vec![
            square("a", 0.0, 0.0, 1.0),
            square("a", 1.0, 0.0, 1.0),
        ]);
        assert!(matches!(dup, Err(Error::DuplicateSector(id)) if id == "a"));
    }

    #[test]
    fn test_within_bbox() {
        let registry = grid();
        let bbox = BoundingBox::new(0.2, 0.2, 0.8, 1.5).unwrap();
        let ids: Vec<_> = registry.within(&bbox).into_iter().map(Sector::id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
