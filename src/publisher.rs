//! Result publication
//!
//! Packages the selected station into the `{state, attributes}` shape read by
//! the host, and provides the clocks used to stamp `last_update`.

use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Mutex;

use crate::error::{EessError, Result};
use crate::normalize::StationRecord;

/// Format of the `last_update` attribute
pub const LAST_UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Attributes attached to a published price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAttributes {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub address: String,
    pub opening_hours: String,
    pub last_update: String,
}

/// The cheapest station of a successful poll
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedResult {
    /// Price in euros per liter
    pub state: f64,
    pub attributes: StationAttributes,
}

/// Value observed by consumers
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SensorState {
    /// Nothing published yet, or the last poll found no station selling the fuel
    #[default]
    NoData,
    Price(PublishedResult),
}

impl SensorState {
    /// Numeric state, `None` for [`SensorState::NoData`]
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Price(p) => Some(p.state),
            Self::NoData => None,
        }
    }

    pub fn attributes(&self) -> Option<&StationAttributes> {
        match self {
            Self::Price(p) => Some(&p.attributes),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

impl Serialize for SensorState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SensorState", 2)?;
        s.serialize_field("state", &self.price())?;
        s.serialize_field("attributes", &self.attributes())?;
        s.end()
    }
}

/// Package the selected station, stamped with `now`
pub fn publish(selected: Option<&StationRecord>, now: NaiveDateTime) -> SensorState {
    let Some(station) = selected else {
        return SensorState::NoData;
    };
    SensorState::Price(PublishedResult {
        state: station.price,
        attributes: StationAttributes {
            latitude: station.latitude(),
            longitude: station.longitude(),
            name: station.name.clone(),
            address: station.address.clone(),
            opening_hours: station.opening_hours.clone(),
            last_update: now.format(LAST_UPDATE_FORMAT).to_string(),
        },
    })
}

/// Source of local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Production clock: current time in the configured zone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Option<Tz>,
}

impl SystemClock {
    /// Host local time
    pub fn local() -> Self {
        Self { tz: None }
    }

    /// `"local"` (or empty) for the host zone, otherwise an IANA name
    pub fn from_timezone(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Ok(Self::local());
        }
        let tz = name
            .parse::<Tz>()
            .map_err(|e| EessError::validation("timezone", format!("'{name}': {e}")))?;
        Ok(Self { tz: Some(tz) })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self.tz {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// Manually driven clock
///
/// Not used by the binary. Integration tests and offline replays of
/// recorded upstream documents drive it with [`FixedClock::set`] and
/// [`FixedClock::advance`].
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
