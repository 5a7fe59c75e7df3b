// Parameters used when materializing the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkConfig {
    // Stops closer than this are linked by a footpath in both directions.
    pub max_footpath_distance_km: f64,
    pub walking_speed_kmh: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_footpath_distance_km: 0.5,
            walking_speed_kmh: 5.0,
        }
    }
}

impl NetworkConfig {
    pub fn with_max_footpath_distance_km(mut self, distance_km: f64) -> Self {
        self.max_footpath_distance_km = distance_km;
        self
    }

    pub fn with_walking_speed_kmh(mut self, speed_kmh: f64) -> Self {
        self.walking_speed_kmh = speed_kmh;
        self
    }

    // No footpaths at all, for networks whose transfers are supplied explicitly.
    pub fn without_footpaths() -> Self {
        Self::default().with_max_footpath_distance_km(0.0)
    }
}
