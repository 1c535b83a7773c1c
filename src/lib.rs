//! # eess-prices - cheapest fuel station sensor for Spanish municipalities
//!
//! Polls the Spanish fuel price directory (EESS) for one municipality,
//! normalizes the comma-decimal station records, picks the cheapest station
//! selling a fuel type and publishes it as a `{state, attributes}` value.
//!
//! ## Architecture
//!
//! - `upstream`: HTTP fetcher and upstream field names
//! - `normalize`: document to canonical station records
//! - `selector`: cheapest-station selection
//! - `publisher`: published result shape and clocks
//! - `poller`: per-instance scheduler with first refresh and manual refresh
//! - `config`, `fuel`: YAML configuration and the fuel-type table
//! - `sensor`: stable identity and entity metadata
//! - `registry`: host-owned map of running instances
//! - `web`: JSON HTTP API over the registry
//! - `logging`, `error`: ambient plumbing

pub mod config;
pub mod error;
pub mod fuel;
pub mod logging;
pub mod normalize;
pub mod poller;
pub mod publisher;
pub mod registry;
pub mod selector;
pub mod sensor;
pub mod upstream;
pub mod web;

// Re-export commonly used types
pub use config::{Config, InstanceConfig, validate_instance};
pub use error::{EessError, Result};
pub use fuel::FuelType;
pub use poller::{PollerHandle, PollerSettings, PricePoller};
pub use publisher::SensorState;
pub use registry::SensorRegistry;
