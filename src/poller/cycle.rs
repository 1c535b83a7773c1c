use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::config::InstanceConfig;
use crate::error::Result;
use crate::normalize::normalize;
use crate::publisher::{Clock, SensorState, publish};
use crate::selector::select;
use crate::upstream::StationSource;

/// Outcome of one successful cycle
#[derive(Debug, Clone)]
pub(crate) struct CycleOutcome {
    pub state: SensorState,
    /// Time the publication was stamped with
    pub stamped_at: NaiveDateTime,
    /// Stations that survived normalization
    pub candidates: usize,
}

/// Fetch, normalize, select and publish for one instance
pub(crate) struct PollCycle {
    config: InstanceConfig,
    source: Arc<dyn StationSource>,
    clock: Arc<dyn Clock>,
}

impl PollCycle {
    pub fn new(config: InstanceConfig, source: Arc<dyn StationSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            source,
            clock,
        }
    }

    /// Run the cycle; the only suspension point is the fetch
    ///
    /// The stamp is never earlier than `not_before`.
    pub async fn run(&self, not_before: Option<NaiveDateTime>) -> Result<CycleOutcome> {
        let document = self.source.fetch(self.config.municipality_id).await?;

        let records = normalize(&document, self.config.fuel_type);
        let now = self.clock.now();
        let stamped_at = not_before.map_or(now, |floor| now.max(floor));
        let state = publish(select(&records), stamped_at);

        Ok(CycleOutcome {
            state,
            stamped_at,
            candidates: records.len(),
        })
    }
}
