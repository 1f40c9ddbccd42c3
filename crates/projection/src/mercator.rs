//! Spherical (Web) Mercator projection.

use std::f64::consts::PI;

/// Sphere radius used by EPSG:3857.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the Web Mercator square is clipped.
pub const MAX_LATITUDE: f64 = 85.0511287798066;

/// Project longitude/latitude degrees to Web Mercator meters.
///
/// Latitudes beyond the clipping latitude are clamped.
pub fn forward(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Unproject Web Mercator meters to longitude/latitude degrees.
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_common::crs::WEB_MERCATOR_HALF_SIZE;

    #[test]
    fn test_forward_origin() {
        let (x, y) = forward(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_forward_world_edge() {
        let (x, y) = forward(180.0, MAX_LATITUDE);
        assert!((x - WEB_MERCATOR_HALF_SIZE).abs() < 1e-6);
        assert!((y - WEB_MERCATOR_HALF_SIZE).abs() < 1e-3);
    }

    #[test]
    fn test_forward_clamps_pole() {
        assert_eq!(forward(0.0, 90.0), forward(0.0, MAX_LATITUDE));
    }

    #[test]
    fn test_inverse_recovers_input() {
        let (x, y) = forward(-73.98, 40.75);
        let (lon, lat) = inverse(x, y);
        assert!((lon + 73.98).abs() < 1e-9);
        assert!((lat - 40.75).abs() < 1e-9);
    }
}
