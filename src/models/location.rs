//! Location models for geolocation fixes and coordinates

use serde::{Deserialize, Serialize};

/// Result of an IP geolocation lookup
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct GeoFix {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default)]
    pub region_code: String,
    #[serde(default)]
    pub region_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub time_zone: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    #[serde(default)]
    pub metro_code: i64,
}

impl GeoFix {
    /// Create a fix carrying only coordinates
    #[must_use]
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Self::default()
        }
    }

    /// The bare coordinates of this fix
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }

    /// Whether two fixes are at the same place.
    ///
    /// Compares the stored coordinates for exact equality; descriptive fields
    /// are ignored.
    #[must_use]
    pub fn same_place(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// Short human readable description used in log lines
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.city.is_empty(), self.region_code.is_empty()) {
            (false, false) => format!("{}, {} ({})", self.city, self.region_code, self.point()),
            (false, true) => format!("{} ({})", self.city, self.point()),
            _ => self.point().to_string(),
        }
    }
}

/// Latitude and longitude, the minimal coordinate used for distance search
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl From<&GeoFix> for Point {
    fn from(fix: &GeoFix) -> Self {
        fix.point()
    }
}
