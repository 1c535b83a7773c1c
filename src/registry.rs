//! Host-owned registry of sensor instances
//!
//! Maps entry ids to running pollers. Entries whose first refresh failed are
//! kept aside with their error so the host can report them.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{Config, InstanceConfig};
use crate::error::{EessError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::poller::{PollerHandle, PollerSettings, PricePoller};
use crate::publisher::{Clock, SystemClock};
use crate::upstream::{HttpStationSource, StationSource};

/// Entry whose setup did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub config: InstanceConfig,
    pub error: String,
}

/// Running instances keyed by entry id
pub struct SensorRegistry {
    entries: BTreeMap<String, PollerHandle>,
    failed: BTreeMap<String, FailedEntry>,
    logger: StructuredLogger,
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            failed: BTreeMap::new(),
            logger: get_logger("registry"),
        }
    }

    /// Start a poller for `config` and register it
    ///
    /// Fails on a duplicate entry id or when the first refresh fails; in the
    /// latter case the entry is remembered in [`SensorRegistry::failed`].
    pub async fn setup_entry(
        &mut self,
        config: InstanceConfig,
        source: Arc<dyn StationSource>,
        clock: Arc<dyn Clock>,
        settings: PollerSettings,
    ) -> Result<&PollerHandle> {
        let entry_id = config.entry_id();
        if self.entries.contains_key(&entry_id) {
            return Err(EessError::validation(
                "entry_id",
                format!("'{entry_id}' is already set up"),
            ));
        }

        match PricePoller::start(config.clone(), source, clock, settings).await {
            Ok(handle) => {
                self.failed.remove(&entry_id);
                self.logger.info(&format!("Entry {entry_id} set up"));
                Ok(self.entries.entry(entry_id).or_insert(handle))
            }
            Err(e) => {
                self.logger
                    .error(&format!("Entry {entry_id} failed to set up: {e}"));
                self.failed.insert(
                    entry_id,
                    FailedEntry {
                        config,
                        error: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    /// Stop and remove an entry; returns whether it existed
    pub async fn unload_entry(&mut self, entry_id: &str) -> bool {
        if self.failed.remove(entry_id).is_some() {
            return true;
        }
        let Some(mut handle) = self.entries.remove(entry_id) else {
            return false;
        };
        handle.shutdown().await;
        self.logger.info(&format!("Entry {entry_id} unloaded"));
        true
    }

    pub fn get(&self, entry_id: &str) -> Option<&PollerHandle> {
        self.entries.get(entry_id)
    }

    /// Running entries ordered by entry id
    pub fn handles(&self) -> impl Iterator<Item = &PollerHandle> {
        self.entries.values()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &FailedEntry)> {
        self.failed.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stop every running entry
    pub async fn shutdown_all(&mut self) {
        let ids: Vec<String> = self.entries.keys().cloned().collect();
        for id in ids {
            self.unload_entry(&id).await;
        }
        self.logger.info("All entries stopped");
    }

    /// Build a registry from a loaded configuration
    ///
    /// Each instance gets its own HTTP source. Instances whose first refresh
    /// fails are recorded as failed; configuration errors abort.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let instances = config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::from_timezone(&config.timezone)?);
        let settings = PollerSettings::from_config(&config.poll);

        let mut registry = Self::new();
        for instance in instances {
            let source: Arc<dyn StationSource> = Arc::new(HttpStationSource::new(&config.http)?);
            if let Err(e) = registry
                .setup_entry(instance, source, clock.clone(), settings)
                .await
            {
                if e.is_configuration_error() {
                    return Err(e);
                }
            }
        }

        registry.logger.info(&format!(
            "Registry ready: {} running, {} failed",
            registry.entries.len(),
            registry.failed.len()
        ));
        Ok(registry)
    }
}
