use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SchedulerSettings;
use crate::channel::Signal;
use crate::geolocation::GeoResolver;
use crate::models::{GeoFix, Point, Station};
use crate::state::SharedState;
use crate::stations::{StationIndex, StationSource};
use crate::{Result, WeatherBarError};

/// Keeps the shared location and station current.
///
/// Bootstraps once, then re-resolves on every geo-update tick and every
/// wake signal from the sleep detector.
pub struct LocationWatcher {
    state: Arc<SharedState>,
    geo: Arc<dyn GeoResolver>,
    stations: Arc<dyn StationSource>,
    fixed_station: Option<String>,
    fixed_point: Option<Point>,
    update_interval: Duration,
    retry_delay: Duration,
    wake: Signal,
    weather: Signal,
    cancel: CancellationToken,
}

impl LocationWatcher {
    #[must_use]
    pub fn new(
        state: Arc<SharedState>,
        geo: Arc<dyn GeoResolver>,
        stations: Arc<dyn StationSource>,
        settings: &SchedulerSettings,
        wake: Signal,
        weather: Signal,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            state,
            geo,
            stations,
            fixed_station: settings.fixed_station.clone(),
            fixed_point: settings.fixed_point,
            update_interval: settings.geo_update_interval,
            retry_delay: settings.geo_retry_delay,
            wake,
            weather,
            cancel,
        }
    }

    /// Run until cancelled. Errors only come out of the bootstrap phase.
    pub async fn run(self) -> Result<()> {
        if let Some(id) = &self.fixed_station {
            info!("Using fixed station {}", id);
            self.state.set_station(Station::fixed(id.as_str()));
            self.weather.notify();
            return Ok(());
        }

        let index = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            index = self.bootstrap() => index?,
        };

        self.steady(&index).await;
        Ok(())
    }

    async fn bootstrap(&self) -> Result<StationIndex> {
        let index = StationIndex::load(self.stations.as_ref()).await?;

        let point = match self.fixed_point {
            Some(point) => {
                info!("Using fixed coordinates {}", point);
                point
            }
            None => {
                let fix = self.geo.resolve().await?;
                info!("Located at {}", fix.describe());
                let point = fix.point();
                self.state.set_location(fix);
                self.state.roll_location();
                point
            }
        };

        self.state.set_point(point);
        let station = index.nearest(&point).cloned().ok_or_else(|| {
            WeatherBarError::no_stations(format!("no station found near {point}"))
        })?;
        info!("Nearest of {} stations is {}", index.len(), station.id);
        self.state.set_station(station);
        self.weather.notify();

        Ok(index)
    }

    async fn steady(&self, index: &StationIndex) {
        let mut ticker = interval_at(Instant::now() + self.update_interval, self.update_interval);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return,
                _ = ticker.tick() => debug!("Geo update due"),
                () = self.wake.recv() => debug!("Resumed from sleep, re-resolving location"),
            }

            if self.fixed_point.is_some() {
                self.weather.notify();
                continue;
            }

            let fix = tokio::select! {
                () = self.cancel.cancelled() => return,
                fix = self.locate_with_retry() => fix,
            };

            if let Some(fix) = fix {
                self.apply(fix, index);
            }
        }
    }

    /// Geolocate, retrying once after the retry delay
    async fn locate_with_retry(&self) -> Option<GeoFix> {
        match self.geo.resolve().await {
            Ok(fix) => return Some(fix),
            Err(e) => warn!("Geolocation failed, retrying in {:?}: {}", self.retry_delay, e),
        }

        tokio::time::sleep(self.retry_delay).await;

        match self.geo.resolve().await {
            Ok(fix) => Some(fix),
            Err(e) => {
                warn!("Geolocation retry failed, skipping this update: {}", e);
                None
            }
        }
    }

    fn apply(&self, fix: GeoFix, index: &StationIndex) {
        let point = fix.point();
        self.state.set_location(fix);
        self.state.set_point(point);

        if let Some(station) = index.nearest(&point) {
            debug!("Nearest station is {}", station.id);
            self.state.set_station(station.clone());
        }

        if self.state.roll_location() {
            info!("Location changed to {}", point);
            self.weather.notify();
        }
        debug!("Shared state after update: {:?}", self.state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::mocks::{FixedStations, ScriptedGeo, pacific_northwest};

    const HOUR: Duration = Duration::from_secs(60 * 60);

    struct Harness {
        state: Arc<SharedState>,
        geo: Arc<ScriptedGeo>,
        wake: Signal,
        weather: Signal,
        cancel: CancellationToken,
    }

    impl Harness {
        fn new(geo: ScriptedGeo) -> Self {
            Self {
                state: Arc::new(SharedState::new()),
                geo: Arc::new(geo),
                wake: Signal::new(),
                weather: Signal::new(),
                cancel: CancellationToken::new(),
            }
        }

        fn watcher(&self, settings: &SchedulerSettings, stations: Vec<Station>) -> LocationWatcher {
            LocationWatcher::new(
                Arc::clone(&self.state),
                self.geo.clone(),
                Arc::new(FixedStations(stations)),
                settings,
                self.wake.clone(),
                self.weather.clone(),
                self.cancel.clone(),
            )
        }
    }

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            geo_update_interval: HOUR,
            ..SchedulerSettings::default()
        }
    }

    fn seattle() -> GeoFix {
        GeoFix::from_coordinates(47.6, -122.3)
    }

    fn portland() -> GeoFix {
        GeoFix::from_coordinates(45.5, -122.7)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_station_skips_geolocation() {
        let harness = Harness::new(ScriptedGeo::new(vec![]));
        let settings = SchedulerSettings {
            fixed_station: Some("KSEA".to_string()),
            ..settings()
        };

        harness.watcher(&settings, vec![]).run().await.unwrap();

        assert_eq!(harness.state.station(), Some(Station::fixed("KSEA")));
        assert!(harness.weather.is_pending());
        assert_eq!(harness.geo.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_resolves_nearest_station() {
        let harness = Harness::new(ScriptedGeo::new(vec![Ok(seattle())]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        assert_eq!(harness.state.wait_for_station().await.id, "KSEA");
        assert_eq!(harness.state.point(), Some(Point::new(47.6, -122.3)));
        assert_eq!(harness.state.previous_location(), Some(seattle()));
        assert!(harness.weather.is_pending());

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_geolocation_failure_is_fatal() {
        let harness = Harness::new(ScriptedGeo::new(vec![Err(WeatherBarError::geolocation(
            "offline",
        ))]));

        let result = harness.watcher(&settings(), pacific_northwest()).run().await;
        assert!(matches!(result, Err(WeatherBarError::Geolocation { .. })));
        assert!(!harness.state.has_station());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_with_empty_station_list_is_fatal() {
        let harness = Harness::new(ScriptedGeo::new(vec![Ok(seattle())]));

        let result = harness.watcher(&settings(), vec![]).run().await;
        assert!(matches!(result, Err(WeatherBarError::NoStations { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_coordinates_bypass_geolocation() {
        let harness = Harness::new(ScriptedGeo::new(vec![]));
        let settings = SchedulerSettings {
            fixed_point: Some(Point::new(45.5, -122.7)),
            ..settings()
        };
        let task = tokio::spawn(harness.watcher(&settings, pacific_northwest()).run());

        assert_eq!(harness.state.wait_for_station().await.id, "KPDX");
        harness.weather.recv().await;

        // A wake is passed straight through to the weather watcher
        harness.wake.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(harness.weather.is_pending());
        assert_eq!(harness.geo.calls(), 0);
        assert_eq!(harness.state.location(), None);

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failure_picks_up_move() {
        let harness = Harness::new(ScriptedGeo::new(vec![
            Ok(seattle()),
            Err(WeatherBarError::geolocation("timeout")),
            Ok(portland()),
        ]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        harness.state.wait_for_station().await;
        harness.weather.recv().await;

        tokio::time::sleep(HOUR + Duration::from_secs(16)).await;
        assert_eq!(harness.geo.calls(), 3);
        assert_eq!(harness.state.station().map(|s| s.id), Some("KPDX".to_string()));
        assert!(harness.weather.is_pending());

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_failure_abandons_cycle() {
        let harness = Harness::new(ScriptedGeo::new(vec![
            Ok(seattle()),
            Err(WeatherBarError::geolocation("timeout")),
            Err(WeatherBarError::geolocation("timeout")),
        ]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        harness.state.wait_for_station().await;
        harness.weather.recv().await;

        tokio::time::sleep(HOUR + Duration::from_secs(16)).await;
        assert_eq!(harness.geo.calls(), 3);
        assert!(!harness.weather.is_pending());
        assert_eq!(harness.state.station().map(|s| s.id), Some("KSEA".to_string()));

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_without_movement_does_not_signal_weather() {
        let harness = Harness::new(ScriptedGeo::new(vec![Ok(seattle())]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        harness.state.wait_for_station().await;
        harness.weather.recv().await;

        harness.wake.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(harness.geo.calls(), 2);
        assert!(!harness.weather.is_pending());

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_before_delay_elapses() {
        let harness = Harness::new(ScriptedGeo::new(vec![
            Ok(seattle()),
            Err(WeatherBarError::geolocation("timeout")),
            Ok(portland()),
        ]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        harness.state.wait_for_station().await;
        harness.weather.recv().await;

        tokio::time::sleep(HOUR + Duration::from_secs(14)).await;
        assert_eq!(harness.geo.calls(), 2);
        assert_eq!(harness.state.station().map(|s| s.id), Some("KSEA".to_string()));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(harness.geo.calls(), 3);

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_stalled_geolocation() {
        let harness = Harness::new(ScriptedGeo::stalling(vec![Ok(seattle())]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        harness.state.wait_for_station().await;
        tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
        assert_eq!(harness.geo.calls(), 2, "steady-state lookup should be in flight");
        assert!(!task.is_finished());

        harness.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_bootstrap_is_clean() {
        let harness = Harness::new(ScriptedGeo::stalling(vec![]));
        let task = tokio::spawn(harness.watcher(&settings(), pacific_northwest()).run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(harness.geo.calls(), 1);

        harness.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!harness.state.has_station());
    }
}
