//! Shared state between the scheduler loops
//!
//! Location, point and station each sit behind their own reader/writer lock.
//! Locks are only held for the in-memory copy; callers never hold one across
//! I/O. Code that needs several fields at once goes through [`SharedState::snapshot`],
//! which takes the locks in the order location → point → station.

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::models::{GeoFix, Point, Station};

#[derive(Debug, Default)]
struct LocationCell {
    current: Option<GeoFix>,
    previous: Option<GeoFix>,
}

/// Consistent copy of every shared field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateSnapshot {
    pub location: Option<GeoFix>,
    pub previous_location: Option<GeoFix>,
    pub point: Option<Point>,
    pub station: Option<Station>,
}

/// Mutable cells written by the location watcher and read by the other loops
#[derive(Debug)]
pub struct SharedState {
    location: RwLock<LocationCell>,
    point: RwLock<Option<Point>>,
    station: RwLock<Option<Station>>,
    station_ready: watch::Sender<bool>,
}

impl SharedState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            location: RwLock::new(LocationCell::default()),
            point: RwLock::new(None),
            station: RwLock::new(None),
            station_ready: watch::Sender::new(false),
        }
    }

    #[must_use]
    pub fn location(&self) -> Option<GeoFix> {
        self.location.read().current.clone()
    }

    #[must_use]
    pub fn previous_location(&self) -> Option<GeoFix> {
        self.location.read().previous.clone()
    }

    pub fn set_location(&self, fix: GeoFix) {
        self.location.write().current = Some(fix);
    }

    /// Compare the current location with the previous one and roll it over.
    ///
    /// Returns `true` when the location moved since the last comparison. The
    /// very first comparison has nothing to compare against and reports no
    /// movement. The previous location is updated either way.
    pub fn roll_location(&self) -> bool {
        let mut cell = self.location.write();
        let moved = match (&cell.current, &cell.previous) {
            (Some(current), Some(previous)) => !current.same_place(previous),
            _ => false,
        };
        cell.previous = cell.current.clone();
        moved
    }

    #[must_use]
    pub fn point(&self) -> Option<Point> {
        *self.point.read()
    }

    pub fn set_point(&self, point: Point) {
        *self.point.write() = Some(point);
    }

    #[must_use]
    pub fn station(&self) -> Option<Station> {
        self.station.read().clone()
    }

    /// Replace the resolved station and release anyone waiting for one
    pub fn set_station(&self, station: Station) {
        *self.station.write() = Some(station);
        self.station_ready.send_replace(true);
    }

    #[must_use]
    pub fn has_station(&self) -> bool {
        self.station.read().is_some()
    }

    /// Wait until a station has been resolved and return it.
    ///
    /// Wakes exactly when [`SharedState::set_station`] first runs; a station
    /// is never cleared once set.
    pub async fn wait_for_station(&self) -> Station {
        let mut ready = self.station_ready.subscribe();
        loop {
            if let Some(station) = self.station() {
                return station;
            }
            // The sender lives in `self`, so the channel cannot close here.
            let closed = ready.wait_for(|ready| *ready).await.is_err();
            if closed {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Copy every field, acquiring locks in location → point → station order
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let location = self.location.read();
        let point = self.point.read();
        let station = self.station.read();
        StateSnapshot {
            location: location.current.clone(),
            previous_location: location.previous.clone(),
            point: *point,
            station: station.clone(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
