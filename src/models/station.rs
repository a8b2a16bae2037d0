//! Observation station model

use serde::{Deserialize, Serialize};

use super::Point;

/// A fixed weather-observation point from the station reference list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    /// Station identifier, e.g. "KSEA"
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Routing class of a station identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    /// Four-character airport-style (ICAO) identifier
    Official,
    /// Personal weather station, any other identifier
    Personal,
}

impl Station {
    #[must_use]
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
        }
    }

    /// A station known only by its identifier, as supplied by configuration
    #[must_use]
    pub fn fixed(id: impl Into<String>) -> Self {
        Self::new(id, 0.0, 0.0)
    }

    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn kind(&self) -> StationKind {
        StationKind::classify(&self.id)
    }
}

impl StationKind {
    /// Classify an identifier by its length
    #[must_use]
    pub fn classify(id: &str) -> Self {
        if id.len() == 4 {
            Self::Official
        } else {
            Self::Personal
        }
    }
}
