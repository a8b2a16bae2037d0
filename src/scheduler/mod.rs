//! Long-running loops that keep the status line current
//!
//! The [`Scheduler`] owns the shared state and hands each loop its
//! collaborators, its signals and a clone of the process-wide cancellation
//! token:
//!
//! - [`LocationWatcher`] geolocates and resolves the nearest station
//! - [`WeatherWatcher`] fetches conditions for the resolved station
//! - [`SleepDetector`] notices suspend/resume through wall-clock gaps
//! - [`Reporter`] renders observations to the output
//!
//! Loops only talk to each other through single-slot [`Mailbox`]es.

mod location_watcher;
mod reporter;
mod sleep_detector;
mod weather_watcher;

#[cfg(test)]
pub(crate) mod mocks;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::channel::{Mailbox, Signal};
use crate::conditions::ConditionsFetcher;
use crate::config::WeatherBarConfig;
use crate::format::Formatter;
use crate::geolocation::GeoResolver;
use crate::models::{Observation, Point};
use crate::state::SharedState;
use crate::stations::StationSource;
use crate::{Result, WeatherBarError};

pub use location_watcher::LocationWatcher;
pub use reporter::Reporter;
pub use sleep_detector::SleepDetector;
pub use weather_watcher::WeatherWatcher;

/// Delay before the single geolocation retry
pub const GEO_RETRY_DELAY: Duration = Duration::from_secs(15);
/// How often the sleep detector samples the wall clock
pub const SLEEP_CHECK_INTERVAL: Duration = Duration::from_secs(1);
/// Wall-clock gap between samples that counts as a resume from sleep
pub const SLEEP_GAP: Duration = Duration::from_secs(30);

/// Timing and override settings for the loops
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub fixed_station: Option<String>,
    pub fixed_point: Option<Point>,
    pub geo_update_interval: Duration,
    pub weather_update_interval: Duration,
    pub geo_retry_delay: Duration,
    pub sleep_check_interval: Duration,
    pub sleep_gap: Duration,
}

impl SchedulerSettings {
    #[must_use]
    pub fn from_config(config: &WeatherBarConfig) -> Self {
        Self {
            fixed_station: config.fixed_station().map(str::to_string),
            fixed_point: config.fixed_point(),
            geo_update_interval: config.geo_update_interval(),
            weather_update_interval: config.weather_update_interval(),
            ..Self::default()
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            fixed_station: None,
            fixed_point: None,
            geo_update_interval: Duration::from_secs(24 * 60 * 60),
            weather_update_interval: Duration::from_secs(60 * 60),
            geo_retry_delay: GEO_RETRY_DELAY,
            sleep_check_interval: SLEEP_CHECK_INTERVAL,
            sleep_gap: SLEEP_GAP,
        }
    }
}

/// External services the loops depend on
#[derive(Clone)]
pub struct Collaborators {
    pub geo: Arc<dyn GeoResolver>,
    pub stations: Arc<dyn StationSource>,
    pub conditions: Arc<dyn ConditionsFetcher>,
}

/// Runs the four loops until cancellation or a fatal startup error
pub struct Scheduler<W> {
    settings: SchedulerSettings,
    collaborators: Collaborators,
    formatter: Formatter,
    output: W,
    state: Arc<SharedState>,
    cancel: CancellationToken,
}

impl<W: AsyncWrite + Unpin + Send + 'static> Scheduler<W> {
    #[must_use]
    pub fn new(
        settings: SchedulerSettings,
        collaborators: Collaborators,
        formatter: Formatter,
        output: W,
    ) -> Self {
        Self {
            settings,
            collaborators,
            formatter,
            output,
            state: Arc::new(SharedState::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops every loop when cancelled
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Spawn the loops and wait for all of them to return.
    ///
    /// The first loop error cancels the others and is returned once every
    /// loop has stopped.
    pub async fn run(self) -> Result<()> {
        let Self {
            settings,
            collaborators,
            formatter,
            output,
            state,
            cancel,
        } = self;

        let weather_signal = Signal::new();
        let wake_signal = Signal::new();
        let observations: Mailbox<Observation> = Mailbox::new();

        let mut tasks = JoinSet::new();
        tasks.spawn(
            LocationWatcher::new(
                Arc::clone(&state),
                Arc::clone(&collaborators.geo),
                Arc::clone(&collaborators.stations),
                &settings,
                wake_signal.clone(),
                weather_signal.clone(),
                cancel.clone(),
            )
            .run(),
        );
        tasks.spawn(
            WeatherWatcher::new(
                Arc::clone(&state),
                Arc::clone(&collaborators.conditions),
                settings.weather_update_interval,
                weather_signal,
                observations.clone(),
                cancel.clone(),
            )
            .run(),
        );
        tasks.spawn(
            SleepDetector::new(
                settings.sleep_check_interval,
                settings.sleep_gap,
                wake_signal,
                cancel.clone(),
            )
            .run(),
        );
        tasks.spawn(Reporter::new(formatter, observations, output, cancel.clone()).run());

        let mut outcome = Ok(());
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| {
                WeatherBarError::from(std::io::Error::other(format!("loop task failed: {e}")))
            });
            match result.and_then(|loop_result| loop_result) {
                Ok(()) => debug!("Loop finished, {} still running", tasks.len()),
                Err(e) => {
                    error!("Stopping: {}", e);
                    cancel.cancel();
                    if outcome.is_ok() {
                        outcome = Err(e);
                    }
                }
            }
        }

        outcome
    }
}
