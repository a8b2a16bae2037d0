//! Data models for the weather bar
//!
//! This module contains the core domain models organized by concern:
//! - Location: geolocation fixes and bare coordinates
//! - Station: entries of the observation-station reference list
//! - Observation: current conditions reported by a station

pub mod location;
pub mod observation;
pub mod station;

// Re-export all public types for convenient access
pub use location::{GeoFix, Point};
pub use observation::Observation;
pub use station::{Station, StationKind};
