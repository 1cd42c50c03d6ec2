//! Resolve place names to coordinates through a Nominatim-compatible service.
//!
//! Requests are bounded by the client timeout. Successful lookups are cached
//! per session so repeated searches for the same place stay off the network.
//!
//! Initially:      search "Nagpur" -- GET /search?q=Nagpur
//! Repeated:       search "nagpur" -- cache hit

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use api::schema::Place;

use super::Geocoder;
use crate::{collections::QueueMap, error::GeocodeError, geography::GeoPoint};

pub mod api;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of distinct queries kept before the oldest is evicted.
const CACHE_CAPACITY: usize = 64;

/// Candidates requested per search.
const CANDIDATE_LIMIT: usize = 5;

pub struct NominatimClient {
    /// HTTP session, carries the timeout and User-Agent.
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    /// Completed queries keyed by normalized text.
    cache: Mutex<QueueMap<String, Vec<GeoPoint>>>,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        Ok(NominatimClient {
            http_client,
            base_url: base_url.into(),
            timeout,
            cache: Mutex::new(QueueMap::with_capacity(CACHE_CAPACITY)),
        })
    }

    fn cache_get(&self, key: &String) -> Option<Vec<GeoPoint>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn cache_insert(&self, key: String, points: Vec<GeoPoint>) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(key, points);
    }

    fn request_error(&self, e: reqwest::Error) -> GeocodeError {
        if e.is_timeout() {
            GeocodeError::Timeout(self.timeout)
        } else if let Some(status) = e.status() {
            GeocodeError::Status(status.as_u16())
        } else if e.is_decode() {
            GeocodeError::InvalidResponse(e.to_string())
        } else {
            GeocodeError::Network(e.to_string())
        }
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Vec<GeoPoint>, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NoResults(String::new()));
        }

        let key = query.to_lowercase();
        if let Some(points) = self.cache_get(&key) {
            tracing::trace!("Cache hit for {query:?}");
            return Ok(points);
        }

        let places = api::search(&self.http_client, &self.base_url, query, CANDIDATE_LIMIT)
            .await
            .map_err(|e| self.request_error(e))?;
        let points = points_from_places(&places)?;
        if points.is_empty() {
            return Err(GeocodeError::NoResults(query.to_owned()));
        }
        tracing::debug!("{query:?} resolved to {} candidate(s), first {}", points.len(), points[0]);

        self.cache_insert(key, points.clone());
        Ok(points)
    }
}

/// Only the first candidate is used, so only the first must be valid. Later
/// candidates with unusable coordinates are dropped.
fn points_from_places(places: &[Place]) -> Result<Vec<GeoPoint>, GeocodeError> {
    let mut places = places.iter();
    let Some(first) = places.next() else {
        return Ok(Vec::new());
    };
    let mut points = vec![point_from_place(first)?];
    for place in places {
        match point_from_place(place) {
            Ok(point) => points.push(point),
            Err(e) => tracing::debug!("Skipping candidate: {e}"),
        }
    }
    Ok(points)
}

fn point_from_place(place: &Place) -> Result<GeoPoint, GeocodeError> {
    let invalid = || {
        GeocodeError::InvalidResponse(format!(
            "bad coordinates ({}, {}) for {}",
            place.lat, place.lon, place.display_name
        ))
    };
    let latitude = place.lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let longitude = place.lon.trim().parse::<f64>().map_err(|_| invalid())?;
    GeoPoint::new(latitude, longitude).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Nothing listens here; any request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    #[test]
    fn test_places_schema() {
        let places: Vec<Place> = serde_json::from_str(
            r#"[
                {"place_id": 1, "lat": "21.1458004", "lon": "79.0881546", "display_name": "Nagpur, Maharashtra, India"},
                {"lat": "21.0", "lon": "79.0"}
            ]"#,
        )
        .unwrap();
        let points = points_from_places(&places).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].latitude, 21.1458004);
        assert_eq!(points[0].longitude, 79.0881546);
    }

    #[test]
    fn test_places_with_bad_coordinates() {
        let places = vec![Place {
            lat: "north".to_owned(),
            lon: "79.0".to_owned(),
            display_name: "Nowhere".to_owned(),
        }];
        assert!(matches!(
            points_from_places(&places),
            Err(GeocodeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_bad_later_candidate_is_skipped() {
        let place = |lat: &str, lon: &str, name: &str| Place {
            lat: lat.to_owned(),
            lon: lon.to_owned(),
            display_name: name.to_owned(),
        };
        let places = vec![
            place("21.1458", "79.0882", "Nagpur, Maharashtra, India"),
            place("north", "79.0", "Nowhere"),
            place("95.0", "10.0", "Beyond the pole"),
            place("22.5", "88.3", "Kolkata, West Bengal, India"),
        ];
        let points = points_from_places(&places).unwrap();
        assert_eq!(
            points,
            vec![
                GeoPoint::new(21.1458, 79.0882).unwrap(),
                GeoPoint::new(22.5, 88.3).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_query_has_no_results() {
        let client = NominatimClient::new(UNREACHABLE, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            client.geocode("   ").await,
            Err(GeocodeError::NoResults(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let client = NominatimClient::new(UNREACHABLE, Duration::from_secs(1)).unwrap();
        let nagpur = GeoPoint::new(21.1458, 79.0882).unwrap();
        client.cache_insert("nagpur".to_owned(), vec![nagpur]);

        let points = client.geocode("  Nagpur ").await.unwrap();
        assert_eq!(points, vec![nagpur]);
    }

    #[tokio::test]
    async fn test_unreachable_service_fails() {
        let client = NominatimClient::new(UNREACHABLE, Duration::from_secs(2)).unwrap();
        let err = client.geocode("Nagpur").await.unwrap_err();
        assert!(matches!(
            err,
            GeocodeError::Network(_) | GeocodeError::Timeout(_)
        ));
    }
}
