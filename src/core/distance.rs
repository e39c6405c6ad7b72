use geo::{GeodesicDistance, Point};

use crate::models::Position;

/// Earth's mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Supplies the distance between two find positions
///
/// Implementations must be symmetric, non-negative and return zero for
/// coincident points.
pub trait DistanceProvider: Send + Sync {
    fn distance_km(&self, a: Position, b: Position) -> f64;
}

/// Geodesic distance on the WGS-84 ellipsoid (Karney's algorithm)
#[derive(Debug, Clone, Copy, Default)]
pub struct Geodesic;

impl DistanceProvider for Geodesic {
    #[inline]
    fn distance_km(&self, a: Position, b: Position) -> f64 {
        geodesic_distance(a.latitude, a.longitude, b.latitude, b.longitude)
    }
}

/// Great-circle distance on a sphere, cheaper and within ~0.5% of geodesic
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceProvider for Haversine {
    #[inline]
    fn distance_km(&self, a: Position, b: Position) -> f64 {
        haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
    }
}

/// Calculate the geodesic distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn geodesic_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // geo points are (x = longitude, y = latitude)
    let a = Point::new(lon1, lat1);
    let b = Point::new(lon2, lat2);
    a.geodesic_distance(&b) / 1000.0
}

/// Calculate the Haversine distance between two points in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
