use std::future::Future;

use crate::error::GeocodeError;
use crate::geography::GeoPoint;

pub mod nominatim;

/// Resolves free text to candidate points, best match first.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> impl Future<Output = Result<Vec<GeoPoint>, GeocodeError>> + Send;
}
