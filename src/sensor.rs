//! Static entity metadata for a sensor instance

use serde::Serialize;

use crate::config::InstanceConfig;

/// Unit of the published state
pub const UNIT_OF_MEASUREMENT: &str = "€/L";

pub const ICON: &str = "mdi:gas-station";

/// State class understood by monitoring hosts for instantaneous readings
pub const STATE_CLASS: &str = "measurement";

/// How a host should present one instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorDescription {
    pub entry_id: String,
    pub unique_id: String,
    pub name: String,
    pub municipality_name: String,
    pub fuel_type: String,
    pub unit_of_measurement: &'static str,
    pub icon: &'static str,
    pub state_class: &'static str,
}

impl SensorDescription {
    pub fn for_instance(cfg: &InstanceConfig) -> Self {
        let fuel = cfg.fuel_type.display_name();
        Self {
            entry_id: cfg.entry_id(),
            unique_id: unique_id(&cfg.municipality_name, fuel),
            name: format!("{} {}", cfg.municipality_name, fuel),
            municipality_name: cfg.municipality_name.clone(),
            fuel_type: fuel.to_string(),
            unit_of_measurement: UNIT_OF_MEASUREMENT,
            icon: ICON,
            state_class: STATE_CLASS,
        }
    }
}

/// Stable identity from `(municipality_name, fuel display name)`
fn unique_id(municipality_name: &str, fuel_display: &str) -> String {
    let slug = |s: &str| {
        s.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>()
    };
    format!("eess_{}_{}", slug(municipality_name), slug(fuel_display))
}
