use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::StationSource;
use super::noaa::NoaaStationParser;
use crate::config::WeatherBarConfig;
use crate::models::Station;
use crate::{Result, WeatherBarError};

/// File name of the cached NOAA station index
pub const STATIONS_FILE: &str = "noaa_stations.xml";

/// NOAA station list backed by an on-disk copy of the station index
pub struct NoaaStationList {
    client: Client,
    url: String,
    cache_path: PathBuf,
    ttl: Duration,
}

impl NoaaStationList {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, cache_dir: &Path, ttl: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            cache_path: cache_dir.join(STATIONS_FILE),
            ttl,
        }
    }

    /// Build from configuration, sharing the given HTTP client
    #[must_use]
    pub fn from_config(client: Client, config: &WeatherBarConfig) -> Self {
        Self::new(
            client,
            config.weather.station_list_url.clone(),
            &config.cache_dir(),
            Duration::from_secs(u64::from(config.cache.station_list_ttl_hours) * 60 * 60),
        )
    }

    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Whether the cached index exists and is younger than the TTL
    async fn cache_is_fresh(&self) -> bool {
        let Ok(metadata) = tokio::fs::metadata(&self.cache_path).await else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            warn!("Could not read station cache mtime, assuming cache invalid");
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < self.ttl,
            // mtime in the future, treat as fresh
            Err(_) => true,
        }
    }

    async fn read_cache(&self) -> Result<Vec<Station>> {
        let bytes = tokio::fs::read(&self.cache_path).await?;
        let stations = NoaaStationParser::parse_xml(&bytes)?;
        info!(
            "Loaded {} stations from cache {:?}",
            stations.len(),
            self.cache_path
        );
        Ok(stations)
    }

    /// Download the station index and replace the cached copy
    #[tracing::instrument(name = "refresh_station_list", level = "debug", skip(self), fields(url = %self.url))]
    async fn refresh(&self) -> Result<Vec<Station>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WeatherBarError::network(format!("Station list request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WeatherBarError::network(format!(
                "Station list download failed with status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let stations = NoaaStationParser::parse_xml(&bytes)?;

        if let Some(dir) = self.cache_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.cache_path, &bytes).await?;
        info!(
            "Downloaded {} stations, cached at {:?}",
            stations.len(),
            self.cache_path
        );

        Ok(stations)
    }
}

#[async_trait]
impl StationSource for NoaaStationList {
    async fn load(&self) -> Result<Vec<Station>> {
        if self.cache_is_fresh().await {
            match self.read_cache().await {
                Ok(stations) if !stations.is_empty() => return Ok(stations),
                Ok(_) => debug!("Cached station index is empty, refreshing"),
                Err(e) => warn!("Station cache unreadable, refreshing: {}", e),
            }
        }

        match self.refresh().await {
            Ok(stations) => Ok(stations),
            Err(e) if self.cache_path.exists() => {
                warn!("Station list refresh failed, using stale cache: {}", e);
                self.read_cache().await
            }
            Err(e) => Err(e),
        }
    }
}
