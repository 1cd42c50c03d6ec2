//! Reads zone features out of GeoJSON and shapefile datasets.
//!
//! Both sources must carry a `zone_name` and a `standard` attribute per
//! feature and polygonal geometry in lon/lat order. Attribute and geometry
//! problems are reported with the feature's position in the dataset.

use std::path::Path;

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, GeoJson};
use shapefile::{dbase, PolygonRing, Shape};

use crate::error::DataError;

pub const ZONE_NAME_PROPERTY: &str = "zone_name";
pub const STANDARD_PROPERTY: &str = "standard";

/// A dataset feature before its zone id has been resolved against the
/// zone table.
#[derive(Debug, Clone)]
pub struct ZoneFeature {
    pub zone_id: String,
    pub standard_ref: String,
    pub boundary: MultiPolygon<f64>,
}

pub fn features_from_geojson_str(text: &str) -> Result<Vec<ZoneFeature>, DataError> {
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|e| DataError::GeoJson(e.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(DataError::GeoJson(
                "expected a Feature or FeatureCollection, found a bare Geometry".to_owned(),
            ))
        }
    };

    features
        .iter()
        .enumerate()
        .map(|(index, feature)| parse_geojson_feature(index, feature))
        .collect()
}

fn parse_geojson_feature(index: usize, feature: &Feature) -> Result<ZoneFeature, DataError> {
    let string_property = |property: &'static str| {
        feature
            .property(property)
            .and_then(|value| value.as_str())
            .map(|value| value.trim().to_owned())
            .ok_or(DataError::MissingProperty { index, property })
    };

    let zone_id = string_property(ZONE_NAME_PROPERTY)?;
    if zone_id.is_empty() {
        return Err(DataError::EmptyZoneId { index });
    }
    let standard_ref = string_property(STANDARD_PROPERTY)?;

    let invalid = |reason: String| DataError::InvalidGeometry {
        index,
        zone_id: zone_id.clone(),
        reason,
    };

    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| invalid("feature has no geometry".to_owned()))?;

    let boundary = match &geometry.value {
        geojson::Value::Polygon(rings) => {
            MultiPolygon(vec![polygon_from_positions(rings).map_err(invalid)?])
        }
        geojson::Value::MultiPolygon(polygons) => MultiPolygon(
            polygons
                .iter()
                .map(|rings| polygon_from_positions(rings))
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?,
        ),
        other => return Err(invalid(format!("unsupported geometry type {}", geometry_type(other)))),
    };

    Ok(ZoneFeature {
        zone_id,
        standard_ref,
        boundary,
    })
}

fn geometry_type(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// First ring is the exterior, the rest are holes.
fn polygon_from_positions(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| {
        let coords = ring
            .iter()
            .map(|position| match position.as_slice() {
                [x, y, ..] => Ok(Coord { x: *x, y: *y }),
                _ => Err(format!("position with {} values", position.len())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        line_string_from_coords(coords)
    });

    let exterior = rings
        .next()
        .ok_or_else(|| "polygon has no rings".to_owned())??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string_from_coords(coords: Vec<Coord<f64>>) -> Result<LineString<f64>, String> {
    if coords.len() < 4 {
        return Err(format!("ring has {} positions, at least 4 required", coords.len()));
    }
    if let Some(bad) = coords.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(format!("non-finite coordinate ({}, {})", bad.x, bad.y));
    }
    Ok(LineString::new(coords))
}

macro_rules! get_char_entry {
    ($attr:expr, $record:ident) => {
        if let Some(dbase::FieldValue::Character(Some(entry))) = $record.get($attr) {
            Some(entry.trim().to_owned())
        } else {
            None
        }
    };
}

/// Reads polygon shapes and their `.dbf` attributes from a shapefile.
pub fn features_from_shapefile(path: &Path) -> Result<Vec<ZoneFeature>, DataError> {
    let mut reader = shapefile::Reader::from_path(path)
        .map_err(|e| DataError::Shapefile(format!("{}: {e}", path.display())))?;

    let mut features = Vec::new();
    for (index, shape_record) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = shape_record.map_err(|e| DataError::Shapefile(e.to_string()))?;

        let zone_id = get_char_entry!(ZONE_NAME_PROPERTY, record).ok_or(DataError::MissingProperty {
            index,
            property: ZONE_NAME_PROPERTY,
        })?;
        if zone_id.is_empty() {
            return Err(DataError::EmptyZoneId { index });
        }
        let standard_ref = get_char_entry!(STANDARD_PROPERTY, record).ok_or(DataError::MissingProperty {
            index,
            property: STANDARD_PROPERTY,
        })?;

        let boundary = match &shape {
            Shape::Polygon(polygon) => polygons_from_rings(polygon.rings()),
            other => Err(format!("unsupported shape type {:?}", other.shapetype())),
        }
        .map_err(|reason| DataError::InvalidGeometry {
            index,
            zone_id: zone_id.clone(),
            reason,
        })?;

        features.push(ZoneFeature {
            zone_id,
            standard_ref,
            boundary,
        });
    }

    Ok(features)
}

/// Groups shapefile rings into polygons: every outer ring opens a new polygon
/// and inner rings attach to the most recent outer ring.
fn polygons_from_rings(rings: &[PolygonRing<shapefile::Point>]) -> Result<MultiPolygon<f64>, String> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        let coords = ring.points().iter().map(|p| Coord { x: p.x, y: p.y }).collect();
        let line = line_string_from_coords(coords)?;
        match ring {
            PolygonRing::Outer(_) => polygons.push((line, Vec::new())),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(line),
                None => return Err("inner ring before any outer ring".to_owned()),
            },
        }
    }
    if polygons.is_empty() {
        return Err("shape has no rings".to_owned());
    }
    Ok(polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect())
}
