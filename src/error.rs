//! Error types and handling for the weather bar

use thiserror::Error;

/// Main error type for the weather bar
#[derive(Error, Debug)]
pub enum WeatherBarError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport failures talking to a remote service
    #[error("Network error: {message}")]
    Network { message: String },

    /// Malformed upstream payloads
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Geolocation lookup failures
    #[error("Geolocation error: {message}")]
    Geolocation { message: String },

    /// The station reference list is empty or could not be loaded
    #[error("No weather stations available: {message}")]
    NoStations { message: String },

    /// A station identifier could not be served
    #[error("Station error: {message}")]
    Station { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherBarError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new geolocation error
    pub fn geolocation<S: Into<String>>(message: S) -> Self {
        Self::Geolocation {
            message: message.into(),
        }
    }

    /// Create a new empty-station-list error
    pub fn no_stations<S: Into<String>>(message: S) -> Self {
        Self::NoStations {
            message: message.into(),
        }
    }

    /// Create a new station error
    pub fn station<S: Into<String>>(message: S) -> Self {
        Self::Station {
            message: message.into(),
        }
    }

    /// Whether this error should abort the process when it happens at startup
    #[must_use]
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Geolocation { .. } | Self::NoStations { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message } => {
                format!("Configuration error: {message}. Please check your config file.")
            }
            Self::Network { .. } => {
                "Unable to reach the weather services. Please check your internet connection."
                    .to_string()
            }
            Self::Parse { .. } => "A weather service returned an unexpected response.".to_string(),
            Self::Geolocation { .. } => {
                "Could not determine your location. Set a station or coordinates in the config file."
                    .to_string()
            }
            Self::NoStations { .. } => {
                "No weather stations are available. You may need to clear the station cache."
                    .to_string()
            }
            Self::Station { message } => format!("Station error: {message}"),
            Self::Io { .. } => {
                "File operation failed. Please check cache directory permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for WeatherBarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::parse(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}
