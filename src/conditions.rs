//! Current-conditions fetching
//!
//! [`NoaaConditionsClient`] serves official (ICAO) stations from the NOAA
//! current-observation feed. [`StationRouter`] picks a fetcher by identifier
//! shape so personal weather stations can be served by another provider.

use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::de::from_reader;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::{Observation, StationKind};
use crate::{Result, WeatherBarError};

/// Fetches the latest observation for a station
#[async_trait]
pub trait ConditionsFetcher: Send + Sync {
    async fn fetch(&self, station_id: &str) -> Result<Observation>;
}

/// NOAA `current_observation` document
#[derive(Debug, Deserialize)]
pub struct CurrentObservationXml {
    #[serde(default)]
    pub station_id: String,
    pub location: Option<String>,
    pub observation_time_rfc822: Option<String>,
    pub temp_f: Option<f64>,
    #[serde(default)]
    pub pressure_mb: f64,
    #[serde(default)]
    pub wind_mph: f64,
    #[serde(default)]
    pub wind_degrees: f64,
}

impl CurrentObservationXml {
    /// Parse a raw NOAA current-observation body in its declared encoding
    pub fn parse_xml(body: &[u8]) -> Result<Self> {
        from_reader(body).map_err(|e| {
            WeatherBarError::parse(format!("Failed to parse current observation: {e}"))
        })
    }

    /// Convert to an [`Observation`]. A document without a station id means
    /// the upstream had nothing to report; one without a temperature is
    /// incomplete and rejected.
    pub fn into_observation(self, requested: &str) -> Result<Observation> {
        if self.station_id.trim().is_empty() {
            return Err(WeatherBarError::station(format!(
                "unable to fetch observation for {requested}"
            )));
        }

        let temperature = self.temp_f.ok_or_else(|| {
            WeatherBarError::parse(format!("observation for {requested} has no temperature"))
        })?;

        Ok(Observation {
            station_id: self.station_id.trim().to_string(),
            temperature,
            pressure: self.pressure_mb,
            wind_speed: self.wind_mph,
            wind_direction: self.wind_degrees,
        })
    }
}

/// NOAA current-observation client
pub struct NoaaConditionsClient {
    client: Client,
    base_url: String,
}

impl NoaaConditionsClient {
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    fn url_for(&self, station_id: &str) -> String {
        format!("{}{}.xml", self.base_url, station_id)
    }
}

#[async_trait]
impl ConditionsFetcher for NoaaConditionsClient {
    #[tracing::instrument(name = "fetch_conditions", level = "debug", skip(self))]
    async fn fetch(&self, station_id: &str) -> Result<Observation> {
        debug!("Fetching conditions for station {} from NOAA", station_id);

        let response = self
            .client
            .get(self.url_for(station_id))
            .send()
            .await
            .map_err(|e| WeatherBarError::network(format!("Conditions request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WeatherBarError::network(format!(
                "NOAA returned {} for station {station_id}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let document = CurrentObservationXml::parse_xml(&bytes)?;
        let observation = document.into_observation(station_id)?;

        debug!("Conditions: {:?}", observation);
        Ok(observation)
    }
}

/// Dispatches official and personal station identifiers to their providers
pub struct StationRouter {
    official: Arc<dyn ConditionsFetcher>,
    personal: Option<Arc<dyn ConditionsFetcher>>,
}

impl StationRouter {
    #[must_use]
    pub fn new(official: Arc<dyn ConditionsFetcher>) -> Self {
        Self {
            official,
            personal: None,
        }
    }

    /// Serve personal weather stations through `fetcher`
    #[must_use]
    pub fn with_personal(mut self, fetcher: Arc<dyn ConditionsFetcher>) -> Self {
        self.personal = Some(fetcher);
        self
    }
}

#[async_trait]
impl ConditionsFetcher for StationRouter {
    async fn fetch(&self, station_id: &str) -> Result<Observation> {
        match StationKind::classify(station_id) {
            StationKind::Official => self.official.fetch(station_id).await,
            StationKind::Personal => match &self.personal {
                Some(personal) => personal.fetch(station_id).await,
                None => Err(WeatherBarError::station(format!(
                    "{station_id} looks like a personal weather station and no provider for those is configured"
                ))),
            },
        }
    }
}
