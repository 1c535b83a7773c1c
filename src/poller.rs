//! Poll scheduler
//!
//! One [`PricePoller`] task per sensor instance. It runs a first refresh
//! before handing out a [`PollerHandle`], then repeats the cycle on a fixed
//! cadence anchored on nominal tick times. Publications go through a watch
//! channel, so readers always see a complete `{state, attributes}` value.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::InstanceConfig;
use crate::error::{EessError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::publisher::{Clock, LAST_UPDATE_FORMAT, SensorState};
use crate::sensor::SensorDescription;
use crate::upstream::StationSource;

mod cycle;
mod runtime;
mod types;

#[cfg(test)]
mod tests;

use cycle::{CycleOutcome, PollCycle};
pub use types::{DEFAULT_POLL_INTERVAL, PollerCommand, PollerSettings, PollerState, PollerStatus};

/// Task-owned side of a sensor instance
pub struct PricePoller {
    cycle: PollCycle,
    settings: PollerSettings,
    logger: StructuredLogger,

    /// Single writer of the published state
    state_tx: watch::Sender<Arc<SensorState>>,

    status_tx: watch::Sender<PollerStatus>,

    commands_rx: mpsc::UnboundedReceiver<PollerCommand>,

    /// Floor for the next `last_update`
    last_stamp: Option<NaiveDateTime>,

    /// A refresh request arrived while a cycle was running
    refresh_pending: bool,
}

impl PricePoller {
    /// Run the first refresh and spawn the poll loop
    ///
    /// A failing first refresh leaves nothing running and returns its error.
    pub async fn start(
        config: InstanceConfig,
        source: Arc<dyn StationSource>,
        clock: Arc<dyn Clock>,
        settings: PollerSettings,
    ) -> Result<PollerHandle> {
        let description = SensorDescription::for_instance(&config);
        let logger = get_logger_with_context(
            LogContext::new("poller")
                .with_entry_id(&description.entry_id)
                .with_field("fuel", config.fuel_type.key().to_string()),
        );

        let (state_tx, state_rx) = watch::channel(Arc::new(SensorState::NoData));
        let (status_tx, status_rx) = watch::channel(PollerStatus {
            interval_secs: settings.interval.as_secs(),
            ..PollerStatus::default()
        });
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let municipality_id = config.municipality_id;

        let mut poller = Self {
            cycle: PollCycle::new(config, source, clock),
            settings,
            logger,
            state_tx,
            status_tx,
            commands_rx,
            last_stamp: None,
            refresh_pending: false,
        };

        poller.logger.info(&format!(
            "Running first refresh for {} (municipality {})",
            description.name, municipality_id
        ));
        let started = Instant::now();
        match poller.cycle.run(None).await {
            Ok(outcome) => poller.record_success(outcome),
            Err(e) => {
                poller.logger.error(&format!("First refresh failed: {e}"));
                poller.record_failure(&e);
                poller.set_state(PollerState::Failed(e.to_string()));
                return Err(e);
            }
        }
        poller.set_state(PollerState::Ready);

        let task = tokio::spawn(poller.run(started));

        Ok(PollerHandle {
            description,
            state_rx,
            status_rx,
            commands_tx,
            task: Some(task),
        })
    }

    fn set_state(&self, state: PollerState) {
        self.status_tx.send_modify(|s| s.state = state);
    }

    fn record_success(&mut self, outcome: CycleOutcome) {
        match outcome.state.price() {
            Some(price) => self.logger.info(&format!(
                "Published {price:.3} €/L ({} candidate stations)",
                outcome.candidates
            )),
            None => self
                .logger
                .info("No station sells this fuel; publishing no data"),
        }

        self.last_stamp = Some(outcome.stamped_at);
        let stamp = outcome.stamped_at.format(LAST_UPDATE_FORMAT).to_string();
        self.state_tx.send_replace(Arc::new(outcome.state));
        self.status_tx.send_modify(|s| {
            s.total_cycles = s.total_cycles.saturating_add(1);
            s.last_error = None;
            s.last_success = Some(stamp);
        });
    }

    fn record_failure(&mut self, error: &EessError) {
        self.status_tx.send_modify(|s| {
            s.total_cycles = s.total_cycles.saturating_add(1);
            s.failed_cycles = s.failed_cycles.saturating_add(1);
            s.last_error = Some(error.to_string());
        });
    }
}

/// Host side of a running poller
#[derive(Debug)]
pub struct PollerHandle {
    description: SensorDescription,
    state_rx: watch::Receiver<Arc<SensorState>>,
    status_rx: watch::Receiver<PollerStatus>,
    commands_tx: mpsc::UnboundedSender<PollerCommand>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn description(&self) -> &SensorDescription {
        &self.description
    }

    pub fn entry_id(&self) -> &str {
        &self.description.entry_id
    }

    /// Latest published state
    pub fn state(&self) -> Arc<SensorState> {
        self.state_rx.borrow().clone()
    }

    pub fn status(&self) -> PollerStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<SensorState>> {
        self.state_rx.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PollerStatus> {
        self.status_rx.clone()
    }

    /// Queue an out-of-schedule cycle
    ///
    /// Returns `false` once the poller has stopped.
    pub fn request_refresh(&self) -> bool {
        self.commands_tx.send(PollerCommand::Refresh).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the poller and wait for its task; idempotent
    pub async fn shutdown(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let _ = self.commands_tx.send(PollerCommand::Shutdown);
        if let Err(e) = task.await {
            tracing::warn!(entry_id = %self.description.entry_id, "Poller task ended abnormally: {e}");
        }
    }
}
