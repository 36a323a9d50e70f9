//! Geographic primitives: great-circle distance and the geocoding seam.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 lat/lon pair, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Haversine great-circle distance between two points, in kilometres.
///
/// Pure: defined for all valid lat/lon pairs, 0 for identical points,
/// symmetric in its arguments.
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Address → coordinates resolution.
///
/// The production system has no real geocoder; callers inject one at startup.
/// `None` means the address could not be resolved — never an error.
pub trait GeocodingProvider: Send + Sync {
    fn geocode(&self, address: &str) -> Option<Point>;
}

/// Default provider: resolves nothing. Distance-based features degrade to
/// absent rather than failing.
#[derive(Debug, Default)]
pub struct NullGeocoder;

impl GeocodingProvider for NullGeocoder {
    fn geocode(&self, _address: &str) -> Option<Point> {
        None
    }
}
