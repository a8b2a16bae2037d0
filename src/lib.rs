//! `weather-bar` - current weather conditions for desktop status bars
//!
//! This library geolocates the machine, resolves the nearest observation
//! station, fetches its current conditions and renders them into a
//! user-defined one-line template.

pub mod channel;
pub mod conditions;
pub mod config;
pub mod error;
pub mod format;
pub mod geolocation;
pub mod models;
pub mod scheduler;
pub mod state;
pub mod stations;

// Re-export core types for public API
pub use channel::{Mailbox, Signal};
pub use conditions::{ConditionsFetcher, NoaaConditionsClient, StationRouter};
pub use config::WeatherBarConfig;
pub use error::WeatherBarError;
pub use format::Formatter;
pub use geolocation::{FreeGeoIpResolver, GeoResolver};
pub use models::{GeoFix, Observation, Point, Station, StationKind};
pub use scheduler::{Collaborators, Scheduler, SchedulerSettings};
pub use state::SharedState;
pub use stations::{NoaaStationList, StationIndex, StationSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherBarError>;
