//! IP geolocation
//!
//! Resolves the machine's approximate location from its network-visible
//! address.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::models::GeoFix;
use crate::{Result, WeatherBarError};

/// Source of the caller's current location
#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve(&self) -> Result<GeoFix>;
}

/// freegeoip-compatible JSON geolocation client
pub struct FreeGeoIpResolver {
    client: Client,
    url: String,
}

impl FreeGeoIpResolver {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeoResolver for FreeGeoIpResolver {
    #[tracing::instrument(name = "geolocate", level = "debug", skip(self), fields(url = %self.url))]
    async fn resolve(&self) -> Result<GeoFix> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WeatherBarError::geolocation(format!("Geolocation request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WeatherBarError::geolocation(format!(
                "Geolocation service returned {}",
                response.status()
            )));
        }

        let fix: GeoFix = response.json().await.map_err(|e| {
            WeatherBarError::parse(format!("Failed to parse geolocation response: {e}"))
        })?;

        debug!("Geolocated to {}", fix.describe());
        Ok(fix)
    }
}
