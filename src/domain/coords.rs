// Coordinates tracked by the round engine.

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The player's pin for the current round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuessCoordinate {
    pub point: GeoPoint,
    pub z_level: i32,
    // Epoch milliseconds of the click that placed the pin.
    pub timestamp: u64,
}

/// Where the current round's scene was actually taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActualCoordinate {
    pub point: GeoPoint,
    pub z_level: i32,
}
