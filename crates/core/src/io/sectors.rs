//! GeoJSON sector collections

use crate::error::{Error, Result};
use crate::vector::Sector;
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default property holding the census sector code
pub const DEFAULT_ID_FIELD: &str = "CD_SETOR";

/// Default property holding a precomputed area in km²
pub const DEFAULT_AREA_FIELD: &str = "AREA_KM2";

/// Which feature properties carry the sector id and area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectorFields {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_area_field")]
    pub area_field: Option<String>,
}

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

fn default_area_field() -> Option<String> {
    Some(DEFAULT_AREA_FIELD.to_string())
}

impl Default for SectorFields {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            area_field: default_area_field(),
        }
    }
}

/// Read sectors from a GeoJSON file
pub fn read_sectors<P: AsRef<Path>>(path: P, fields: &SectorFields) -> Result<Vec<Sector>> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_sectors(&text, fields)
}

/// Parse sectors from GeoJSON text.
///
/// Accepts a FeatureCollection or a single Feature. Features without an id
/// or without a (multi)polygon geometry are skipped with a warning.
pub fn parse_sectors(text: &str, fields: &SectorFields) -> Result<Vec<Sector>> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(Error::GeoJson(
                "expected a Feature or FeatureCollection, found a bare geometry".into(),
            ))
        }
    };

    let total = features.len();
    let mut sectors = Vec::with_capacity(total);

    for (n, feature) in features.into_iter().enumerate() {
        let Some(id) = feature_id(&feature, &fields.id_field) else {
            tracing::warn!("Feature #{n} has no '{}' property, skipping", fields.id_field);
            continue;
        };

        let area = fields
            .area_field
            .as_deref()
            .and_then(|name| feature.property(name))
            .and_then(json_number);

        let Some(geometry) = feature.geometry else {
            tracing::warn!("Sector {id} has no geometry, skipping");
            continue;
        };

        let multipolygon = match geo_types::Geometry::<f64>::try_from(geometry) {
            Ok(geo_types::Geometry::MultiPolygon(mp)) => mp,
            Ok(geo_types::Geometry::Polygon(p)) => geo_types::MultiPolygon(vec![p]),
            Ok(_) => {
                tracing::warn!("Sector {id} geometry is not areal, skipping");
                continue;
            }
            Err(e) => {
                tracing::warn!("Sector {id} geometry could not be converted: {e}");
                continue;
            }
        };

        match Sector::new(id, multipolygon) {
            Ok(sector) => sectors.push(match area {
                Some(a) => sector.with_area_km2(a),
                None => sector,
            }),
            Err(e) => tracing::warn!("{e}, skipping"),
        }
    }

    tracing::debug!("Parsed {} of {} sector features", sectors.len(), total);
    Ok(sectors)
}

fn feature_id(feature: &Feature, field: &str) -> Option<String> {
    let from_property = feature.property(field).and_then(|v| match v {
        JsonValue::String(s) => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let from_feature = || match &feature.id {
        Some(Id::String(s)) => Some(s.trim().to_string()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => None,
    };
    from_property.or_else(from_feature).filter(|s| !s.is_empty())
}

fn json_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// GeoJSON feature for a sector with the given properties.
///
/// The sector id is stored under `id_field` and as the feature id.
pub fn sector_feature(sector: &Sector, id_field: &str, mut properties: JsonObject) -> Feature {
    properties.insert(id_field.to_string(), JsonValue::from(sector.id()));
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(sector.geometry()))),
        id: Some(Id::String(sector.id().to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Write features as a GeoJSON FeatureCollection
pub fn write_features<P: AsRef<Path>>(path: P, features: Vec<Feature>) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let text = GeoJson::from(collection).to_string();
    fs::write(path.as_ref(), text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"CD_SETOR": "350950205000001", "AREA_KM2": 0.75},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [-47.07, -22.82], [-47.06, -22.82], [-47.06, -22.81],
                    [-47.07, -22.81], [-47.07, -22.82]
                ]]}
            },
            {
                "type": "Feature",
                "properties": {"CD_SETOR": 350950205000002},
                "geometry": {"type": "MultiPolygon", "coordinates": [[[
                    [-47.06, -22.82], [-47.05, -22.82], [-47.05, -22.81],
                    [-47.06, -22.81], [-47.06, -22.82]
                ]]]}
            },
            {
                "type": "Feature",
                "properties": {"NAME": "no id"},
                "geometry": {"type": "Point", "coordinates": [-47.0, -22.0]}
            },
            {
                "type": "Feature",
                "properties": {"CD_SETOR": "line"},
                "geometry": {"type": "LineString", "coordinates": [[-47.0, -22.0], [-47.1, -22.1]]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_sectors() {
        let sectors = parse_sectors(COLLECTION, &SectorFields::default()).unwrap();
        assert_eq!(sectors.len(), 2);

        assert_eq!(sectors[0].id(), "350950205000001");
        assert_relative_eq!(sectors[0].area_km2(), 0.75);

        assert_eq!(sectors[1].id(), "350950205000002");
        assert!(sectors[1].area_km2() > 1.0);
    }

    #[test]
    fn test_custom_id_field() {
        let fields = SectorFields {
            id_field: "NAME".into(),
            area_field: None,
        };
        // only the point carries NAME, and points are not areal
        assert!(parse_sectors(COLLECTION, &fields).unwrap().is_empty());
    }

    #[test]
    fn test_bare_geometry_rejected() {
        let text = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#;
        assert!(parse_sectors(text, &SectorFields::default()).is_err());
    }

    #[test]
    fn test_sector_feature_carries_id() {
        let sectors = parse_sectors(COLLECTION, &SectorFields::default()).unwrap();
        let feature = sector_feature(&sectors[0], DEFAULT_ID_FIELD, JsonObject::new());
        assert_eq!(
            feature.property(DEFAULT_ID_FIELD),
            Some(&JsonValue::from("350950205000001"))
        );
        assert!(feature.geometry.is_some());
    }
}
