//! Wind speed and direction derived from the orthogonal components.

/// Wind speed (m/s) from the u (eastward) and v (northward) components.
pub(crate) fn wind_speed(u: f64, v: f64) -> f64 {
    (u * u + v * v).sqrt()
}

/// Meteorological wind direction in degrees: the direction the wind blows
/// *from*, 0° = north, increasing clockwise.
pub(crate) fn wind_direction(u: f64, v: f64) -> f64 {
    (270.0 - v.atan2(u).to_degrees()).rem_euclid(360.0)
}
