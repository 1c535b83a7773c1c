use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::error::EessError;

use super::types::{PollerCommand, PollerState};

impl super::PricePoller {
    /// Main loop; `first_tick` is the nominal time of the first refresh
    pub(super) async fn run(mut self, first_tick: Instant) {
        let period = self.settings.interval;
        let mut next_tick = first_tick + period;
        // The first refresh may itself have run past one or more ticks
        self.skip_missed_ticks(&mut next_tick, period);

        loop {
            if !std::mem::take(&mut self.refresh_pending) {
                tokio::select! {
                    () = sleep_until(next_tick) => {
                        next_tick += period;
                    }
                    cmd = self.commands_rx.recv() => match cmd {
                        Some(PollerCommand::Refresh) => self.logger.debug("Manual refresh requested"),
                        Some(PollerCommand::Shutdown) | None => {
                            self.logger.info("Shutdown requested");
                            break;
                        }
                    },
                }
            }

            if self.poll_cancellable().await.is_break() {
                break;
            }
            self.skip_missed_ticks(&mut next_tick, period);
        }

        self.set_state(PollerState::Stopped);
        self.logger.info("Poller stopped");
    }

    /// One cycle raced against the command channel
    ///
    /// Shutdown drops the in-flight fetch; refresh requests are remembered
    /// and coalesce into a single follow-up cycle.
    async fn poll_cancellable(&mut self) -> ControlFlow<()> {
        self.set_state(PollerState::Polling);
        self.logger.debug("Starting poll cycle");

        let not_before = self.last_stamp;
        let finished = {
            let cycle = self.cycle.run(not_before);
            tokio::pin!(cycle);
            loop {
                tokio::select! {
                    result = &mut cycle => break Some(result),
                    cmd = self.commands_rx.recv() => match cmd {
                        Some(PollerCommand::Refresh) => self.refresh_pending = true,
                        Some(PollerCommand::Shutdown) | None => break None,
                    },
                }
            }
        };

        match finished {
            Some(Ok(outcome)) => self.record_success(outcome),
            Some(Err(e)) => {
                self.logger
                    .warn(&format!("Poll cycle failed, keeping previous result: {e}"));
                self.record_failure(&e);
            }
            None => {
                self.logger.info("In-flight cycle cancelled by shutdown");
                self.record_failure(&EessError::Cancelled);
                return ControlFlow::Break(());
            }
        }

        self.set_state(PollerState::Ready);
        ControlFlow::Continue(())
    }

    /// Move `next_tick` past ticks that elapsed while a cycle was running
    fn skip_missed_ticks(&mut self, next_tick: &mut Instant, period: Duration) {
        let now = Instant::now();
        let mut skipped = 0u64;
        while *next_tick < now {
            *next_tick += period;
            skipped += 1;
        }
        if skipped > 0 {
            self.logger.warn(&format!(
                "Poll cycle overran the interval; skipped {skipped} tick(s)"
            ));
            self.status_tx
                .send_modify(|s| s.overrun_count = s.overrun_count.saturating_add(skipped));
        }
    }
}
