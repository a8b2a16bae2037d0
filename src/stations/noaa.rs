use quick_xml::de::from_reader;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::Station;
use crate::{Result, WeatherBarError};

/// NOAA station index parser
pub struct NoaaStationParser;

/// NOAA `index.xml` structure for deserialization
#[derive(Debug, Deserialize)]
pub struct NoaaStationIndexXml {
    #[serde(rename = "station", default)]
    pub stations: Vec<NoaaStationXml>,
}

#[derive(Debug, Deserialize)]
pub struct NoaaStationXml {
    pub station_id: Option<String>,
    pub state: Option<String>,
    pub station_name: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl NoaaStationXml {
    /// Convert a NOAA index entry to a [`Station`]
    pub fn to_station(&self) -> Result<Station> {
        let id = self
            .station_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WeatherBarError::parse("Station entry without station_id"))?;

        let latitude = parse_coordinate(id, "latitude", self.latitude.as_deref())?;
        let longitude = parse_coordinate(id, "longitude", self.longitude.as_deref())?;

        Ok(Station::new(id, latitude, longitude))
    }
}

fn parse_coordinate(id: &str, name: &str, value: Option<&str>) -> Result<f64> {
    let value = value
        .map(str::trim)
        .ok_or_else(|| WeatherBarError::parse(format!("Station {id} has no {name}")))?;

    value
        .parse::<f64>()
        .map_err(|_| WeatherBarError::parse(format!("Invalid {name} for station {id}: {value}")))
}

impl NoaaStationParser {
    /// Parse a raw NOAA station index body, keeping document order.
    ///
    /// NOAA serves ISO-8859-1; the declared encoding is honoured.
    pub fn parse_xml(body: &[u8]) -> Result<Vec<Station>> {
        let index: NoaaStationIndexXml = from_reader(body).map_err(|e| {
            WeatherBarError::parse(format!("Failed to parse NOAA station index: {e}"))
        })?;

        let mut stations = Vec::with_capacity(index.stations.len());
        let mut parse_errors = 0;

        for entry in &index.stations {
            match entry.to_station() {
                Ok(station) => stations.push(station),
                Err(e) => {
                    warn!("Skipping NOAA station entry: {}", e);
                    parse_errors += 1;
                }
            }
        }

        debug!(
            "Parsed {} stations from NOAA index ({} parse errors)",
            stations.len(),
            parse_errors
        );

        Ok(stations)
    }
}
