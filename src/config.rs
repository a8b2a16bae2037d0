//! Configuration management for the weather bar
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherBarError;
use crate::format::Formatter;
use crate::models::Point;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the weather bar
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherBarConfig {
    /// Station and data source settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Output formatting
    #[serde(default)]
    pub format: FormatConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Station and data source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Fixed station identifier; disables geolocation entirely.
    ///
    /// Only 4-character NOAA (ICAO) identifiers are served. Longer personal
    /// weather station identifiers such as `KWASEATT42` are recognised but
    /// no provider for them ships, so every fetch for one fails.
    pub station: Option<String>,
    /// Fixed latitude; requires `longitude`
    pub latitude: Option<f64>,
    /// Fixed longitude; requires `latitude`
    pub longitude: Option<f64>,
    /// Hours between geolocation refreshes
    #[serde(default = "default_geo_update_hours")]
    pub geo_update_hours: u32,
    /// Minutes between conditions refreshes
    #[serde(default = "default_weather_update_minutes")]
    pub weather_update_minutes: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// IP geolocation endpoint
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    /// Base URL for current-conditions documents
    #[serde(default = "default_conditions_url")]
    pub conditions_url: String,
    /// NOAA station index URL
    #[serde(default = "default_station_list_url")]
    pub station_list_url: String,
}

/// Output formatting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormatConfig {
    /// Output template with `%placeholder%` fields
    #[serde(rename = "weather-format", default)]
    pub weather_format: String,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// Station index TTL in hours
    #[serde(default = "default_station_list_ttl")]
    pub station_list_ttl_hours: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_geo_update_hours() -> u32 {
    24
}

fn default_weather_update_minutes() -> u32 {
    60
}

fn default_timeout() -> u32 {
    10
}

fn default_geolocation_url() -> String {
    "https://freegeoip.app/json/".to_string()
}

fn default_conditions_url() -> String {
    "https://w1.weather.gov/xml/current_obs/".to_string()
}

fn default_station_list_url() -> String {
    "https://w1.weather.gov/xml/current_obs/index.xml".to_string()
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("weather-bar"))
        .unwrap_or_else(|| PathBuf::from(".weather-bar"))
        .to_string_lossy()
        .into_owned()
}

fn default_station_list_ttl() -> u32 {
    168
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            station: None,
            latitude: None,
            longitude: None,
            geo_update_hours: default_geo_update_hours(),
            weather_update_minutes: default_weather_update_minutes(),
            timeout_seconds: default_timeout(),
            geolocation_url: default_geolocation_url(),
            conditions_url: default_conditions_url(),
            station_list_url: default_station_list_url(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
            station_list_ttl_hours: default_station_list_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl WeatherBarConfig {
    /// Load configuration from `config_path`, or from the default file
    /// location when `None`, with environment overrides applied
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(WeatherBarError::config(format!(
                "config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERBAR_WEATHER__STATION=KSEA
        builder = builder.add_source(
            Environment::with_prefix("WEATHERBAR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherBarConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weather-bar").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.geo_update_hours == 0 {
            self.weather.geo_update_hours = default_geo_update_hours();
        }
        if self.weather.weather_update_minutes == 0 {
            self.weather.weather_update_minutes = default_weather_update_minutes();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.weather.geolocation_url.is_empty() {
            self.weather.geolocation_url = default_geolocation_url();
        }
        if self.weather.conditions_url.is_empty() {
            self.weather.conditions_url = default_conditions_url();
        }
        if self.weather.station_list_url.is_empty() {
            self.weather.station_list_url = default_station_list_url();
        }
        if self
            .weather
            .station
            .as_deref()
            .is_some_and(|station| station.trim().is_empty())
        {
            self.weather.station = None;
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.station_list_ttl_hours == 0 {
            self.cache.station_list_ttl_hours = default_station_list_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the fixed station and coordinate overrides
    fn validate_location(&self) -> Result<()> {
        match (self.weather.latitude, self.weather.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(WeatherBarError::config(format!(
                        "latitude {lat} is outside -90..=90"
                    ))
                    .into());
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(WeatherBarError::config(format!(
                        "longitude {lon} is outside -180..=180"
                    ))
                    .into());
                }
            }
            (None, None) => {}
            _ => {
                return Err(WeatherBarError::config(
                    "latitude and longitude must be set together",
                )
                .into());
            }
        }

        if let Some(station) = &self.weather.station {
            if station.trim().chars().any(char::is_whitespace) {
                return Err(WeatherBarError::config(format!(
                    "station identifier '{station}' contains whitespace"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                WeatherBarError::config("Request timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.geo_update_hours > 24 * 30 {
            return Err(WeatherBarError::config(
                "Geolocation interval cannot exceed 720 hours (30 days)",
            )
            .into());
        }

        if self.weather.weather_update_minutes > 24 * 60 {
            return Err(WeatherBarError::config(
                "Weather update interval cannot exceed 1440 minutes (1 day)",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        if self.format.weather_format.trim().is_empty() {
            return Err(WeatherBarError::config(
                "format.weather-format must be set to an output template",
            )
            .into());
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherBarError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("geolocation_url", &self.weather.geolocation_url),
            ("conditions_url", &self.weather.conditions_url),
            ("station_list_url", &self.weather.station_list_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherBarError::config(format!(
                    "weather.{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Fixed coordinates overriding geolocation, if configured
    #[must_use]
    pub fn fixed_point(&self) -> Option<Point> {
        match (self.weather.latitude, self.weather.longitude) {
            (Some(lat), Some(lon)) => Some(Point::new(lat, lon)),
            _ => None,
        }
    }

    /// Fixed station identifier, if configured
    #[must_use]
    pub fn fixed_station(&self) -> Option<&str> {
        self.weather.station.as_deref().map(str::trim)
    }

    #[must_use]
    pub fn geo_update_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.weather.geo_update_hours) * 60 * 60)
    }

    #[must_use]
    pub fn weather_update_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.weather.weather_update_minutes) * 60)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.weather.timeout_seconds))
    }

    /// Cache directory with a leading `~` expanded
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        match self.cache.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.cache.location)),
            None => PathBuf::from(&self.cache.location),
        }
    }

    #[must_use]
    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.format.weather_format.clone())
    }
}
