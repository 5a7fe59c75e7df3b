use crate::network::Timestamp;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon - self.lon).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        // Rounding can push a slightly above 1 for antipodal points.
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_KM * c
    }

    // Plain average of the two coordinates. Only used as a ball centre, where any point works as long as the
    // radius is measured from it.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate::new((self.lat + other.lat) / 2.0, (self.lon + other.lon) / 2.0)
    }
}

/// Time in seconds to walk `distance_km` at `speed_kmh`, rounded to the nearest second and never less than one.
pub fn walking_duration(distance_km: f64, speed_kmh: f64) -> Timestamp {
    let seconds = (distance_km / speed_kmh * 3600.0).round();
    // A zero-second footpath would let the scan hop between stops for free.
    (seconds as Timestamp).max(1)
}
