//! Spherical-earth math for headings and route lengths.

use crate::models::{GeoPoint, Waypoint};

/// Mean earth radius used by every distance calculation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate distance between two points in meters (Haversine formula).
///
/// The haversine term is clamped to `[0, 1]` so rounding on antipodal or
/// coincident points cannot push `sqrt(1 - a)` into NaN.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two points in meters.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Initial great-circle bearing from `from` to `to`, in degrees `[0, 360)`.
/// 0 = north, 90 = east. Coincident points yield 0.
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_lambda = (to.lon - from.lon).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    normalize_heading(y.atan2(x).to_degrees())
}

/// Wrap any finite angle into `[0, 360)`.
pub fn normalize_heading(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Sum of segment lengths over consecutive waypoints.
pub fn route_length(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| haversine_distance(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .sum()
}

/// Linear interpolation in degree space; `t = 0` is `a`, `t = 1` is `b`.
pub fn interpolate(a: &GeoPoint, b: &GeoPoint, t: f64) -> GeoPoint {
    GeoPoint {
        lat: a.lat + t * (b.lat - a.lat),
        lon: a.lon + t * (b.lon - a.lon),
    }
}

/// Arithmetic mean of two positions.
pub fn midpoint(a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    GeoPoint {
        lat: (a.lat + b.lat) / 2.0,
        lon: (a.lon + b.lon) / 2.0,
    }
}

/// Shift a position by raw degree deltas.
pub fn offset(point: &GeoPoint, dlat: f64, dlon: f64) -> GeoPoint {
    GeoPoint {
        lat: point.lat + dlat,
        lon: point.lon + dlon,
    }
}

/// Shift a position by a small angular radius along a compass bearing.
///
/// Works in degree space (no projection), which is what the planners use for
/// their fixed-size offsets of a few tens of meters.
pub fn offset_polar(point: &GeoPoint, radius_deg: f64, bearing_deg: f64) -> GeoPoint {
    let theta = bearing_deg.to_radians();
    offset(point, radius_deg * theta.cos(), radius_deg * theta.sin())
}
