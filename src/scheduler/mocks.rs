use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::conditions::ConditionsFetcher;
use crate::geolocation::GeoResolver;
use crate::models::{GeoFix, Observation, Station};
use crate::stations::StationSource;
use crate::{Result, WeatherBarError};

/// Replays scripted geolocation results, then repeats the last fix or,
/// when stalling, never answers again
#[derive(Default)]
pub struct ScriptedGeo {
    script: Mutex<VecDeque<Result<GeoFix>>>,
    last: Mutex<Option<GeoFix>>,
    stall: bool,
    calls: AtomicUsize,
}

impl ScriptedGeo {
    pub fn new(script: Vec<Result<GeoFix>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn stalling(script: Vec<Result<GeoFix>>) -> Self {
        Self {
            stall: true,
            ..Self::new(script)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoResolver for ScriptedGeo {
    async fn resolve(&self) -> Result<GeoFix> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(fix)) => {
                *self.last.lock() = Some(fix.clone());
                Ok(fix)
            }
            Some(Err(e)) => Err(e),
            None if self.stall => std::future::pending().await,
            None => self
                .last
                .lock()
                .clone()
                .ok_or_else(|| WeatherBarError::geolocation("no scripted fix")),
        }
    }
}

pub struct FixedStations(pub Vec<Station>);

#[async_trait]
impl StationSource for FixedStations {
    async fn load(&self) -> Result<Vec<Station>> {
        Ok(self.0.clone())
    }
}

/// Returns a canned observation tagged with the requested station
pub struct CannedConditions {
    template: Observation,
    fail: bool,
    stall: bool,
    calls: AtomicUsize,
}

impl CannedConditions {
    pub fn new(template: Observation) -> Self {
        Self {
            template,
            fail: false,
            stall: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Observation::default())
        }
    }

    /// A fetcher whose requests never complete
    pub fn stalling() -> Self {
        Self {
            stall: true,
            ..Self::new(Observation::default())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConditionsFetcher for CannedConditions {
    async fn fetch(&self, station_id: &str) -> Result<Observation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(WeatherBarError::network("upstream unavailable"));
        }
        Ok(Observation {
            station_id: station_id.to_string(),
            ..self.template.clone()
        })
    }
}

pub fn pacific_northwest() -> Vec<Station> {
    vec![
        Station::new("KPDX", 45.59, -122.6),
        Station::new("KSEA", 47.44, -122.31),
        Station::new("KGEG", 47.62, -117.53),
    ]
}
