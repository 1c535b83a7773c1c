//! Upstream fuel-price directory integration
//!
//! The Spanish ministry publishes current prices for every land service
//! station ("EESS") through a public REST service. This module knows the
//! endpoint and the field names; [`normalize`](crate::normalize) interprets
//! the payload.

pub mod client;
pub mod fields;

pub use client::{HttpStationSource, StationSource};

/// Municipality filter endpoint; the municipality id is appended verbatim
pub const DEFAULT_BASE_URL: &str = "https://sedeaplicaciones.minetur.gob.es/ServiciosRESTCarburantes/PreciosCarburantes/EstacionesTerrestres/FiltroMunicipio/";

/// Decoded upstream document
pub type Document = serde_json::Value;
