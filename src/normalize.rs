//! Payload normalization
//!
//! Turns an upstream document into canonical station records for one fuel
//! type. Malformed records are dropped with a debug log; the function never
//! fails and depends only on its inputs.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::fuel::FuelType;
use crate::upstream::fields;

pub mod number;

pub use number::parse_decimal;

/// A station offering the requested fuel, in canonical form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecord {
    pub name: String,
    /// `(latitude, longitude)` in decimal degrees
    pub coordinates: (f64, f64),
    pub address: String,
    pub opening_hours: String,
    /// Euros per liter
    pub price: f64,
}

impl StationRecord {
    pub fn latitude(&self) -> f64 {
        self.coordinates.0
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.1
    }
}

/// Normalize an upstream document for `fuel`
///
/// Records come out in upstream order. When two records share a name the
/// cheaper one survives in the slot of the first; equal prices keep the
/// first.
pub fn normalize(document: &Value, fuel: FuelType) -> Vec<StationRecord> {
    let Some(stations) = document.get(fields::STATION_LIST).and_then(Value::as_array) else {
        debug!(
            "Upstream document has no '{}' array; treating as empty",
            fields::STATION_LIST
        );
        return Vec::new();
    };

    let mut records: Vec<StationRecord> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for (idx, raw) in stations.iter().enumerate() {
        let Some(obj) = raw.as_object() else {
            debug!(index = idx, "Skipping non-object station entry");
            continue;
        };
        let Some(record) = project_station(obj, fuel, idx) else {
            continue;
        };

        match by_name.get(&record.name) {
            Some(&slot) => {
                if record.price < records[slot].price {
                    debug!(
                        station = %record.name,
                        "Duplicate station name; keeping cheaper price {}",
                        record.price
                    );
                    records[slot] = record;
                }
            }
            None => {
                by_name.insert(record.name.clone(), records.len());
                records.push(record);
            }
        }
    }

    records
}

fn project_station(obj: &Map<String, Value>, fuel: FuelType, idx: usize) -> Option<StationRecord> {
    let field = fuel.upstream_field();
    let raw_price = obj.get(field)?;
    if is_blank(raw_price) {
        return None;
    }

    let name = text_field(obj, fields::STATION_NAME);
    let price = match numeric_field(raw_price) {
        Some(p) if p > 0.0 => p,
        _ => {
            debug!(index = idx, station = %name, "Unparseable or non-positive price {raw_price}");
            return None;
        }
    };

    if name.trim().is_empty() {
        debug!(index = idx, "Station without a name; dropped");
        return None;
    }

    let latitude = obj.get(fields::STATION_LATITUDE).and_then(numeric_field);
    let longitude = obj.get(fields::STATION_LONGITUDE).and_then(numeric_field);
    let coordinates = match (latitude, longitude) {
        (Some(lat), Some(lon)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) => {
            (lat, lon)
        }
        _ => {
            debug!(
                index = idx,
                station = %name,
                "Missing or out-of-range coordinates {:?}/{:?}",
                obj.get(fields::STATION_LATITUDE),
                obj.get(fields::STATION_LONGITUDE)
            );
            return None;
        }
    };

    Some(StationRecord {
        name,
        coordinates,
        address: text_field(obj, fields::STATION_ADDRESS),
        opening_hours: text_field(obj, fields::STATION_OPENING_HOURS),
        price,
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn numeric_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
