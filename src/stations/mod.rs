//! Observation station reference list and nearest-station search
//!
//! Stations are loaded once through a [`StationSource`] and are read-only
//! afterwards. Resolution is a linear great-circle scan; the reference list
//! holds a few thousand entries, which needs no spatial index.

pub mod cache;
pub mod noaa;

use async_trait::async_trait;
use tracing::info;

use crate::models::{Point, Station};
use crate::{Result, WeatherBarError};

pub use cache::NoaaStationList;
pub use noaa::NoaaStationParser;

/// Supplies the ordered station reference list
#[async_trait]
pub trait StationSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Station>>;
}

/// Great-circle distance in kilometers between two points
#[must_use]
pub fn distance_km(from: &Point, to: &Point) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: from.latitude,
            longitude: from.longitude,
        },
        haversine::Location {
            latitude: to.latitude,
            longitude: to.longitude,
        },
        haversine::Units::Kilometers,
    )
}

/// Station closest to `point`, or `None` for an empty list.
///
/// A later station only replaces the current best when it is strictly
/// closer, so the first of several equidistant stations wins.
#[must_use]
pub fn nearest_station<'a>(point: &Point, stations: &'a [Station]) -> Option<&'a Station> {
    let mut best: Option<(&Station, f64)> = None;

    for station in stations {
        let distance = distance_km(point, &station.point());
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((station, distance)),
        }
    }

    best.map(|(station, _)| station)
}

/// Loaded station reference list
#[derive(Debug, Clone, Default)]
pub struct StationIndex {
    stations: Vec<Station>,
}

impl StationIndex {
    #[must_use]
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// Load the reference list; an empty list is an error
    pub async fn load(source: &dyn StationSource) -> Result<Self> {
        let index = Self::new(source.load().await?);
        if index.is_empty() {
            return Err(WeatherBarError::no_stations(
                "the station reference list is empty",
            ));
        }
        info!("Station index ready with {} stations", index.len());
        Ok(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station closest to `point`
    #[must_use]
    pub fn nearest(&self, point: &Point) -> Option<&Station> {
        nearest_station(point, &self.stations)
    }
}
