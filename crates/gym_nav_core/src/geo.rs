use crate::model::LatLng;

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in metres.
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

pub fn within(a: LatLng, b: LatLng, epsilon_m: f64) -> bool {
    haversine_m(a, b) <= epsilon_m
}

/// Initial compass bearing from `a` towards `b`, in [0, 360).
pub fn initial_bearing(a: LatLng, b: LatLng) -> f32 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_bearing(y.atan2(x).to_degrees() as f32)
}

pub fn normalize_bearing(deg: f32) -> f32 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if b >= 360.0 { 0.0 } else { b }
}

/// Smallest absolute angle between two bearings, in [0, 180].
pub fn bearing_delta(a: f32, b: f32) -> f32 {
    let d = (normalize_bearing(a) - normalize_bearing(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}
