//! Point-in-zone queries against a [`ZoneRegistry`].
//!
//! Regions are scanned in dataset order and the first region whose boundary
//! strictly contains the point wins. The data format allows overlapping
//! regions, so dataset order is the tie-break.

use geo::{Contains, Intersects};
use serde::Serialize;

use super::{GeoPoint, ZoneRegion, ZoneRegistry};

/// Decimal places used when coordinates are displayed or exported.
pub const COORDINATE_PRECISION: usize = 5;

/// Snapshot of the matched zone plus the queried point. The point keeps full
/// precision; only its rendering is rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub zone_id: String,
    pub wind_speed_mps: u32,
    pub standard_ref: String,
    pub point: GeoPoint,
}

impl LookupResult {
    fn from_region(region: &ZoneRegion, point: GeoPoint) -> Self {
        LookupResult {
            zone_id: region.zone_id().to_owned(),
            wind_speed_mps: region.wind_speed_mps(),
            standard_ref: region.standard_ref().to_owned(),
            point,
        }
    }

    pub fn latitude_text(&self) -> String {
        format!("{:.*}", COORDINATE_PRECISION, self.point.latitude)
    }

    pub fn longitude_text(&self) -> String {
        format!("{:.*}", COORDINATE_PRECISION, self.point.longitude)
    }
}

/// Serialized with rounded coordinate strings, matching the report.
impl Serialize for LookupResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("LookupResult", 5)?;
        state.serialize_field("zone_id", &self.zone_id)?;
        state.serialize_field("wind_speed_mps", &self.wind_speed_mps)?;
        state.serialize_field("standard_ref", &self.standard_ref)?;
        state.serialize_field("latitude", &self.latitude_text())?;
        state.serialize_field("longitude", &self.longitude_text())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    Found(LookupResult),
    /// The point lies outside every region.
    NotFound(GeoPoint),
}

impl LocateOutcome {
    pub fn result(&self) -> Option<&LookupResult> {
        match self {
            LocateOutcome::Found(result) => Some(result),
            LocateOutcome::NotFound(_) => None,
        }
    }

    pub fn point(&self) -> GeoPoint {
        match self {
            LocateOutcome::Found(result) => result.point,
            LocateOutcome::NotFound(point) => *point,
        }
    }
}

impl ZoneRegion {
    /// True when the point lies strictly inside an outer ring and outside
    /// that polygon's holes. Points on an edge are not contained.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let point = point.to_point();
        self.bounds().intersects(&point) && self.boundary().contains(&point)
    }
}

fn containing_regions(
    registry: &ZoneRegistry,
    point: GeoPoint,
) -> impl Iterator<Item = &ZoneRegion> {
    registry
        .regions()
        .iter()
        .filter(move |region| region.contains(point))
}

pub fn locate(point: GeoPoint, registry: &ZoneRegistry) -> LocateOutcome {
    match containing_regions(registry, point).next() {
        Some(region) => {
            tracing::debug!("{point} is in {}", region.zone_id());
            LocateOutcome::Found(LookupResult::from_region(region, point))
        }
        None => {
            tracing::debug!("{point} is outside every zone");
            LocateOutcome::NotFound(point)
        }
    }
}

/// Every region containing the point, in dataset order.
pub fn locate_all(point: GeoPoint, registry: &ZoneRegistry) -> Vec<&ZoneRegion> {
    containing_regions(registry, point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geography::tests::fixture_registry;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).unwrap()
    }

    #[test]
    fn test_point_inside_single_region() {
        let registry = fixture_registry();
        let outcome = locate(point(22.5, 79.0), &registry);
        let result = outcome.result().expect("point should be inside wind_zone_47");
        assert_eq!(result.zone_id, "wind_zone_47");
        assert_eq!(result.wind_speed_mps, 47);
        assert_eq!(result.standard_ref, "IS 875 (Part 3)");
        assert_eq!(result.latitude_text(), "22.50000");
        assert_eq!(result.longitude_text(), "79.00000");
    }

    #[test]
    fn test_full_precision_is_retained() {
        let registry = fixture_registry();
        let outcome = locate(point(22.123456789, 78.987654321), &registry);
        let result = outcome.result().unwrap();
        assert_eq!(result.point.latitude, 22.123456789);
        assert_eq!(result.latitude_text(), "22.12346");
        assert_eq!(result.longitude_text(), "78.98765");
    }

    #[test]
    fn test_point_in_second_polygon_of_multipolygon() {
        let registry = fixture_registry();
        let outcome = locate(point(11.0, 71.0), &registry);
        assert_eq!(outcome.result().unwrap().zone_id, "wind_zone_39");
    }

    #[test]
    fn test_point_outside_all_regions() {
        let registry = fixture_registry();
        let target = point(-10.0, 20.0);
        assert_eq!(locate(target, &registry), LocateOutcome::NotFound(target));
        assert!(locate_all(target, &registry).is_empty());
    }

    #[test]
    fn test_point_inside_bounds_but_outside_polygon() {
        // inside the combined bounding box of wind_zone_39's two parts, outside both
        let registry = fixture_registry();
        let outcome = locate(point(16.0, 75.0), &registry);
        assert!(outcome.result().is_none());
    }

    #[test]
    fn test_overlap_first_in_dataset_order_wins() {
        let registry = fixture_registry();
        // inside wind_zone_47 and wind_zone_55
        let target = point(23.5, 79.5);
        let all: Vec<&str> = locate_all(target, &registry)
            .iter()
            .map(|r| r.zone_id())
            .collect();
        assert_eq!(all, vec!["wind_zone_47", "wind_zone_55"]);
        for _ in 0..10 {
            assert_eq!(
                locate(target, &registry).result().unwrap().zone_id,
                "wind_zone_47"
            );
        }

        // inside wind_zone_39 and wind_zone_55
        let target = point(23.5, 80.5);
        assert_eq!(
            locate(target, &registry).result().unwrap().zone_id,
            "wind_zone_39"
        );
    }

    #[test]
    fn test_shared_edge_falls_to_neither_side() {
        let registry = fixture_registry();
        // on the edge shared by wind_zone_47 and wind_zone_39, below wind_zone_55
        let outcome = locate(point(22.5, 80.0), &registry);
        assert!(matches!(outcome, LocateOutcome::NotFound(_)));
    }

    #[test]
    fn test_holes_are_excluded() {
        let registry = crate::geography::ZoneRegistry::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": [{
                "type": "Feature",
                "properties": { "zone_name": "wind_zone_33", "standard": "IS 875 (Part 3)" },
                "geometry": { "type": "Polygon", "coordinates": [
                    [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
                    [[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]]
                ]}
            }]}"#,
            crate::geography::zone_table::ZoneTable::default(),
        )
        .unwrap();
        assert!(locate(point(5.0, 5.0), &registry).result().is_none());
        assert!(locate(point(2.0, 2.0), &registry).result().is_some());
    }

    #[test]
    fn test_result_serializes_rounded_coordinates() {
        let registry = fixture_registry();
        let outcome = locate(point(22.5, 79.0), &registry);
        let json = serde_json::to_value(outcome.result().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "zone_id": "wind_zone_47",
                "wind_speed_mps": 47,
                "standard_ref": "IS 875 (Part 3)",
                "latitude": "22.50000",
                "longitude": "79.00000",
            })
        );
    }
}
