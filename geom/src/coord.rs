use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bearing, Distance};

/// Fixed-point steps per degree.
const COORDINATE_PRECISION: f64 = 1_000_000.0;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A GPS position in fixed-point microdegrees. Storage is integral so that
/// equality and hashing are exact; all math promotes to [`LonLat`].
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize, Default,
)]
pub struct Coordinate {
    pub lon: i32,
    pub lat: i32,
}

impl Coordinate {
    pub fn new(lon: i32, lat: i32) -> Coordinate {
        Coordinate { lon, lat }
    }

    /// Lossless conversion to the floating form used for math.
    pub fn to_lon_lat(self) -> LonLat {
        LonLat::new(
            f64::from(self.lon) / COORDINATE_PRECISION,
            f64::from(self.lat) / COORDINATE_PRECISION,
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Coordinate({}, {})", self.lon, self.lat)
    }
}

/// longitude is x, latitude is y
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }

    /// Round back to fixed-point storage.
    pub fn to_fixed(self) -> Coordinate {
        Coordinate::new(
            (self.longitude * COORDINATE_PRECISION).round() as i32,
            (self.latitude * COORDINATE_PRECISION).round() as i32,
        )
    }

    /// Great-circle distance to `other`.
    pub fn gps_dist(self, other: LonLat) -> Distance {
        // Haversine distance
        let lon1 = self.longitude.to_radians();
        let lon2 = other.longitude.to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        let a = (delta_lat / 2.0).sin().powi(2)
            + (delta_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Distance::meters(EARTH_RADIUS_M * c)
    }

    /// The compass direction from `self` towards `other`.
    pub fn bearing_to(self, other: LonLat) -> Bearing {
        let lon_delta = (other.longitude - self.longitude).to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let y = lon_delta.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * lon_delta.cos();
        Bearing::new(y.atan2(x).to_degrees())
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({}, {})", self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_round_trip() {
        for (lon, lat) in [(0, 0), (13_400_954, 52_520_008), (-122_303_000, 47_644_000)] {
            let c = Coordinate::new(lon, lat);
            assert_eq!(c.to_lon_lat().to_fixed(), c);
        }
    }

    #[test]
    fn haversine_sanity() {
        // One millidegree of latitude is about 111 meters anywhere on earth
        let a = LonLat::new(0.0, 0.0);
        let b = LonLat::new(0.0, 0.001);
        let d = a.gps_dist(b).inner_meters();
        assert!((d - 111.2).abs() < 1.0, "got {}", d);
        assert_eq!(a.gps_dist(a), Distance::ZERO);
    }

    #[test]
    fn cardinal_bearings() {
        let origin = LonLat::new(0.0, 0.0);
        assert_eq!(origin.bearing_to(LonLat::new(0.0, 0.001)).degrees(), 0.0);
        assert_eq!(origin.bearing_to(LonLat::new(0.001, 0.0)).degrees(), 90.0);
        assert_eq!(origin.bearing_to(LonLat::new(0.0, -0.001)).degrees(), 180.0);
        assert_eq!(origin.bearing_to(LonLat::new(-0.001, 0.0)).degrees(), 270.0);
    }
}
