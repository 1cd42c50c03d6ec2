use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use geo::BoundingRect;
use geo_types::{MultiPolygon, Point, Rect};
use itertools::Itertools;

use self::map_load::ZoneFeature;
use self::zone_table::{Color, ZoneTable};
use crate::error::{DataError, LookupError, ParseError};

pub mod locate;
pub mod map_load;
pub mod zone_table;

/// A validated geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParseError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ParseError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ParseError::LongitudeOutOfRange(longitude));
        }
        Ok(GeoPoint { latitude, longitude })
    }

    /// x = longitude, y = latitude.
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Parses `"lat,lon"` text, e.g. `"22.5, 79.0"`.
impl FromStr for GeoPoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let &[lat, lon] = parts.as_slice() else {
            return Err(ParseError::ComponentCount(parts.len()));
        };
        let number = |text: &str| {
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::NotNumeric(text.to_owned()))
        };
        GeoPoint::new(number(lat)?, number(lon)?)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// One labeled wind zone polygon from the dataset.
#[derive(Debug, Clone)]
pub struct ZoneRegion {
    zone_id: String,
    wind_speed_mps: u32,
    standard_ref: String,
    boundary: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

impl ZoneRegion {
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn wind_speed_mps(&self) -> u32 {
        self.wind_speed_mps
    }

    pub fn standard_ref(&self) -> &str {
        &self.standard_ref
    }

    pub fn boundary(&self) -> &MultiPolygon<f64> {
        &self.boundary
    }

    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }
}

/// Immutable, ordered set of zone regions plus the zone table they were
/// validated against.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    regions: Vec<ZoneRegion>,
    table: ZoneTable,
}

impl ZoneRegistry {
    /// Builds a registry from features in dataset order. Every zone id must be
    /// present in `table`.
    pub fn new(features: Vec<ZoneFeature>, table: ZoneTable) -> Result<Self, DataError> {
        if features.is_empty() {
            return Err(DataError::Empty);
        }

        let mut regions = Vec::with_capacity(features.len());
        for (index, feature) in features.into_iter().enumerate() {
            let Ok(wind_speed_mps) = table.speed_for(&feature.zone_id) else {
                return Err(DataError::UnmappedZone {
                    index,
                    zone_id: feature.zone_id,
                });
            };
            let Some(bounds) = feature.boundary.bounding_rect() else {
                return Err(DataError::InvalidGeometry {
                    index,
                    zone_id: feature.zone_id,
                    reason: "empty boundary".to_owned(),
                });
            };
            regions.push(ZoneRegion {
                zone_id: feature.zone_id,
                wind_speed_mps,
                standard_ref: feature.standard_ref,
                boundary: feature.boundary,
                bounds,
            });
        }

        tracing::info!(
            "Loaded {} zone regions ({} distinct zones)",
            regions.len(),
            regions.iter().map(|r| &r.zone_id).unique().count()
        );
        Ok(ZoneRegistry { regions, table })
    }

    pub fn from_geojson_str(text: &str, table: ZoneTable) -> Result<Self, DataError> {
        ZoneRegistry::new(map_load::features_from_geojson_str(text)?, table)
    }

    /// Loads a `.geojson`/`.json` or `.shp` dataset.
    pub fn load(path: &Path, table: ZoneTable) -> Result<Self, DataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let features = match extension.as_deref() {
            Some("geojson") | Some("json") => {
                let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
                    path: path.to_owned(),
                    source,
                })?;
                map_load::features_from_geojson_str(&text)?
            }
            Some("shp") => map_load::features_from_shapefile(path)?,
            _ => return Err(DataError::UnsupportedSource(path.to_owned())),
        };
        tracing::debug!("Parsed {} features from {}", features.len(), path.display());
        ZoneRegistry::new(features, table)
    }

    /// Loads on a blocking worker so the runtime stays responsive.
    pub async fn load_async(path: PathBuf, table: ZoneTable) -> Result<Self, DataError> {
        tokio::task::spawn_blocking(move || ZoneRegistry::load(&path, table))
            .await
            .map_err(|e| DataError::LoadTask(e.to_string()))?
    }

    pub fn speed_for(&self, zone_id: &str) -> Result<u32, LookupError> {
        self.table.speed_for(zone_id)
    }

    pub fn color_for(&self, zone_id: &str) -> Result<Color, LookupError> {
        self.table.color_for(zone_id)
    }

    /// Regions in dataset order.
    pub fn regions(&self) -> &[ZoneRegion] {
        &self.regions
    }

    /// Distinct zone ids in dataset order.
    pub fn zone_ids(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.zone_id.as_str()).unique().collect()
    }

    pub fn table(&self) -> &ZoneTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two adjacent squares and one square overlapping both, in that order.
    pub(crate) const FIXTURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "zone_name": "wind_zone_47", "standard": "IS 875 (Part 3)" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[78.0, 22.0], [80.0, 22.0], [80.0, 24.0], [78.0, 24.0], [78.0, 22.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "zone_name": "wind_zone_39", "standard": "IS 875 (Part 3)" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[80.0, 22.0], [82.0, 22.0], [82.0, 24.0], [80.0, 24.0], [80.0, 22.0]]],
                        [[[70.0, 10.0], [72.0, 10.0], [72.0, 12.0], [70.0, 12.0], [70.0, 10.0]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "zone_name": "wind_zone_55", "standard": "IS 875 (Part 3)" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[79.0, 23.0], [81.0, 23.0], [81.0, 25.0], [79.0, 25.0], [79.0, 23.0]]]
                }
            }
        ]
    }"#;

    pub(crate) fn fixture_registry() -> ZoneRegistry {
        ZoneRegistry::from_geojson_str(FIXTURE, ZoneTable::default()).unwrap()
    }

    #[test]
    fn test_parse_coordinates() {
        let point: GeoPoint = "22.5, 79.0".parse().unwrap();
        assert_eq!(point, GeoPoint { latitude: 22.5, longitude: 79.0 });
        assert_eq!("  -33.9,151.2 ".parse::<GeoPoint>().unwrap().longitude, 151.2);
    }

    #[test]
    fn test_parse_coordinates_errors() {
        assert_eq!("22.5".parse::<GeoPoint>(), Err(ParseError::ComponentCount(1)));
        assert_eq!("1,2,3".parse::<GeoPoint>(), Err(ParseError::ComponentCount(3)));
        assert_eq!(
            "22.5,east".parse::<GeoPoint>(),
            Err(ParseError::NotNumeric("east".to_owned()))
        );
        assert_eq!(
            "NaN,1".parse::<GeoPoint>(),
            Err(ParseError::NotNumeric("NaN".to_owned()))
        );
        assert_eq!(
            "91,0".parse::<GeoPoint>(),
            Err(ParseError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            "0,-181".parse::<GeoPoint>(),
            Err(ParseError::LongitudeOutOfRange(-181.0))
        );
    }

    #[test]
    fn test_registry_mapping_is_consistent() {
        let registry = fixture_registry();
        let table = ZoneTable::default();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.zone_ids(),
            vec!["wind_zone_47", "wind_zone_39", "wind_zone_55"]
        );
        for zone_id in registry.zone_ids() {
            assert_eq!(registry.speed_for(zone_id), table.speed_for(zone_id));
            assert_eq!(registry.color_for(zone_id), table.color_for(zone_id));
        }
        for region in registry.regions() {
            assert_eq!(
                region.wind_speed_mps(),
                registry.speed_for(region.zone_id()).unwrap()
            );
        }
    }

    #[test]
    fn test_unknown_zone_lookup_fails() {
        let registry = fixture_registry();
        assert_eq!(
            registry.color_for("wind_zone_12"),
            Err(LookupError::UnknownZone("wind_zone_12".to_owned()))
        );
        assert!(registry.speed_for("").is_err());
    }

    #[test]
    fn test_unmapped_zone_fails_load() {
        let dataset = FIXTURE.replace("wind_zone_39", "wind_zone_40");
        let err = ZoneRegistry::from_geojson_str(&dataset, ZoneTable::default()).unwrap_err();
        assert!(matches!(
            err,
            DataError::UnmappedZone { index: 1, ref zone_id } if zone_id == "wind_zone_40"
        ));
    }

    #[test]
    fn test_empty_collection_fails_load() {
        let err = ZoneRegistry::from_geojson_str(
            r#"{"type": "FeatureCollection", "features": []}"#,
            ZoneTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DataError::Empty));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.geojson");
        std::fs::write(&path, FIXTURE).unwrap();
        let registry = ZoneRegistry::load(&path, ZoneTable::default()).unwrap();
        assert_eq!(registry.len(), 3);

        let bad = dir.path().join("zones.kml");
        std::fs::write(&bad, FIXTURE).unwrap();
        assert!(matches!(
            ZoneRegistry::load(&bad, ZoneTable::default()),
            Err(DataError::UnsupportedSource(_))
        ));
        assert!(matches!(
            ZoneRegistry::load(&dir.path().join("missing.geojson"), ZoneTable::default()),
            Err(DataError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_async() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.json");
        std::fs::write(&path, FIXTURE).unwrap();
        let registry = ZoneRegistry::load_async(path, ZoneTable::default())
            .await
            .unwrap();
        assert_eq!(registry.regions()[0].zone_id(), "wind_zone_47");
    }
}
