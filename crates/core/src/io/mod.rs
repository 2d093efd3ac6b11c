//! I/O operations for reading and writing geospatial data

mod native;
mod sectors;

pub use native::{read_geotiff, read_geotiff_from_buffer, write_geotiff_to_buffer};
pub use sectors::{
    parse_sectors, read_sectors, sector_feature, write_features, SectorFields, DEFAULT_AREA_FIELD,
    DEFAULT_ID_FIELD,
};
