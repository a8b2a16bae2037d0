use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::Result;
use crate::channel::{Mailbox, Signal};
use crate::conditions::ConditionsFetcher;
use crate::models::Observation;
use crate::state::SharedState;

/// Fetches conditions for the resolved station on every weather-update
/// tick or signal and hands the result to the reporter
pub struct WeatherWatcher {
    state: Arc<SharedState>,
    conditions: Arc<dyn ConditionsFetcher>,
    update_interval: Duration,
    trigger: Signal,
    observations: Mailbox<Observation>,
    cancel: CancellationToken,
}

impl WeatherWatcher {
    #[must_use]
    pub fn new(
        state: Arc<SharedState>,
        conditions: Arc<dyn ConditionsFetcher>,
        update_interval: Duration,
        trigger: Signal,
        observations: Mailbox<Observation>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            state,
            conditions,
            update_interval,
            trigger,
            observations,
            cancel,
        }
    }

    pub async fn run(self) -> Result<()> {
        let mut ticker = interval_at(Instant::now() + self.update_interval, self.update_interval);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                _ = ticker.tick() => debug!("Weather update due"),
                () = self.trigger.recv() => debug!("Weather update requested"),
            }

            let station = tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                station = self.state.wait_for_station() => station,
            };

            let fetched = tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                fetched = self.conditions.fetch(&station.id) => fetched,
            };

            match fetched {
                Ok(observation) => {
                    if self.observations.send(observation).is_some() {
                        debug!("Replaced an observation that was never reported");
                    }
                }
                Err(e) => warn!("Failed to fetch conditions for {}: {}", station.id, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Station;
    use crate::scheduler::mocks::CannedConditions;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn observation() -> Observation {
        Observation {
            temperature: 55.0,
            wind_direction: 10.0,
            ..Observation::default()
        }
    }

    struct Harness {
        state: Arc<SharedState>,
        trigger: Signal,
        observations: Mailbox<Observation>,
        cancel: CancellationToken,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                state: Arc::new(SharedState::new()),
                trigger: Signal::new(),
                observations: Mailbox::new(),
                cancel: CancellationToken::new(),
            }
        }

        fn spawn(&self, conditions: Arc<CannedConditions>) -> tokio::task::JoinHandle<Result<()>> {
            let watcher = WeatherWatcher::new(
                Arc::clone(&self.state),
                conditions,
                HOUR,
                self.trigger.clone(),
                self.observations.clone(),
                self.cancel.clone(),
            );
            tokio::spawn(watcher.run())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_waits_for_station_before_fetching() {
        let harness = Harness::new();
        let conditions = Arc::new(CannedConditions::new(observation()));
        let task = harness.spawn(Arc::clone(&conditions));

        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(conditions.calls(), 0, "fetched before a station was resolved");
        assert!(!harness.observations.is_pending());

        harness.state.set_station(Station::fixed("KSEA"));
        let delivered = harness.observations.recv().await;
        assert_eq!(delivered.station_id, "KSEA");
        assert_eq!(conditions.calls(), 1);

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_fetches_periodically() {
        let harness = Harness::new();
        harness.state.set_station(Station::fixed("KSEA"));
        let conditions = Arc::new(CannedConditions::new(observation()));
        let task = harness.spawn(Arc::clone(&conditions));

        tokio::time::sleep(HOUR / 2).await;
        assert_eq!(conditions.calls(), 0, "no fetch before the first tick");

        tokio::time::sleep(HOUR).await;
        assert_eq!(conditions.calls(), 1);
        assert!(harness.observations.is_pending());

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreported_observation_is_replaced() {
        let harness = Harness::new();
        harness.state.set_station(Station::fixed("KSEA"));
        let conditions = Arc::new(CannedConditions::new(observation()));
        let task = harness.spawn(Arc::clone(&conditions));

        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(conditions.calls(), 2);
        assert!(harness.observations.try_recv().is_some());
        assert!(harness.observations.try_recv().is_none());

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_keeps_watching() {
        let harness = Harness::new();
        harness.state.set_station(Station::fixed("KSEA"));
        let conditions = Arc::new(CannedConditions::failing());
        let task = harness.spawn(Arc::clone(&conditions));

        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(conditions.calls(), 2);
        assert!(!harness.observations.is_pending());
        assert!(!task.is_finished());

        harness.cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting_for_station() {
        let harness = Harness::new();
        let task = harness.spawn(Arc::new(CannedConditions::new(observation())));

        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
        harness.cancel.cancel();

        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_abandons_stalled_fetch() {
        let harness = Harness::new();
        harness.state.set_station(Station::fixed("KSEA"));
        let conditions = Arc::new(CannedConditions::stalling());
        let task = harness.spawn(Arc::clone(&conditions));

        harness.trigger.notify();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(conditions.calls(), 1);
        assert!(!task.is_finished());

        harness.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!harness.observations.is_pending());
    }
}
