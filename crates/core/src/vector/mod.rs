//! Administrative sector polygons and the registry that indexes them

mod bbox;
mod registry;
mod sector;

pub use bbox::BoundingBox;
pub use registry::SectorRegistry;
pub use sector::Sector;
