// src/geom.rs
//! Point geometry in projected web-mercator coordinates

/// Spherical mercator earth radius in meters (EPSG:3857).
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit beyond which the mercator projection degenerates.
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// An immutable point in web-mercator meters.
///
/// Markers on the map hold one of these; it is never mutated after
/// creation. `Copy` stands in for the cheap geometry clone the
/// rendering overlay takes each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Project a lon/lat pair into web-mercator meters.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Self {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
            .tan()
            .ln();
        Self { x, y }
    }

    /// Inverse projection back to (lon, lat) degrees.
    pub fn to_lon_lat(&self) -> (f64, f64) {
        let lon = (self.x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (self.y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        (lon, lat)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_origin() {
        let p = Point::from_lon_lat(0.0, 0.0);
        assert!(p.x().abs() < 1e-6);
        assert!(p.y().abs() < 1e-6);
    }

    #[test]
    fn test_known_projection() {
        // 180 degrees east maps to half the mercator circumference
        let p = Point::from_lon_lat(180.0, 0.0);
        assert!((p.x() - 20_037_508.34).abs() < 1.0);
    }

    #[test]
    fn test_round_trip() {
        let p = Point::from_lon_lat(-71.119277, 42.438878);
        let (lon, lat) = p.to_lon_lat();
        assert!((lon - (-71.119277)).abs() < 1e-9);
        assert!((lat - 42.438878).abs() < 1e-9);
    }

    #[test]
    fn test_polar_latitude_is_clamped() {
        let p = Point::from_lon_lat(0.0, 90.0);
        assert!(p.y().is_finite());
    }
}
