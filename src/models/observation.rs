//! Current-conditions observation model and unit helpers

use serde::{Deserialize, Serialize};

/// Compass labels, padded to three characters, starting at North
pub const COMPASS_LABELS: [&str; 16] = [
    "  N", "NNE", " NE", "ENE", "  E", "ESE", " SE", "SSE", "  S", "SSW", " SW", "WSW", "  W",
    "WNW", " NW", "NNW",
];

/// A single snapshot of conditions reported by a station
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Observation {
    pub station_id: String,
    /// Temperature in Fahrenheit
    pub temperature: f64,
    /// Barometric pressure in millibar
    pub pressure: f64,
    /// Wind speed in mph
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: f64,
}

impl Observation {
    /// Convert temperature from Fahrenheit to Celsius
    #[must_use]
    pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
        (fahrenheit - 32.0) * 5.0 / 9.0
    }

    /// Index into [`COMPASS_LABELS`] for a wind direction in degrees
    #[must_use]
    pub fn compass_index(degrees: f64) -> usize {
        let bucket = ((degrees + 11.25) / 22.5).floor() as i64;
        bucket.rem_euclid(16) as usize
    }

    /// Padded 16-point compass label for a wind direction in degrees
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: f64) -> &'static str {
        COMPASS_LABELS[Self::compass_index(degrees)]
    }

    #[must_use]
    pub fn temperature_celsius(&self) -> f64 {
        Self::fahrenheit_to_celsius(self.temperature)
    }

    #[must_use]
    pub fn wind_cardinal(&self) -> &'static str {
        Self::wind_direction_to_cardinal(self.wind_direction)
    }
}
