//! Supported fuel types and their upstream price fields

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::EessError;

/// Fuel selector for one sensor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuelType {
    Gasoline95,
    Gasoline95E10,
    Gasoline95Premium,
    Gasoline98,
    Gasoline98E10,
    DieselA,
    DieselPremium,
    DieselB,
    Lpg,
    CompressedNaturalGas,
    LiquefiedNaturalGas,
    Hydrogen,
}

impl FuelType {
    /// Every supported fuel type, in table order
    pub const ALL: [FuelType; 12] = [
        Self::Gasoline95,
        Self::Gasoline95E10,
        Self::Gasoline95Premium,
        Self::Gasoline98,
        Self::Gasoline98E10,
        Self::DieselA,
        Self::DieselPremium,
        Self::DieselB,
        Self::Lpg,
        Self::CompressedNaturalGas,
        Self::LiquefiedNaturalGas,
        Self::Hydrogen,
    ];

    /// Configuration key
    pub fn key(self) -> &'static str {
        match self {
            Self::Gasoline95 => "G95",
            Self::Gasoline95E10 => "G95E10",
            Self::Gasoline95Premium => "G95PREMIUM",
            Self::Gasoline98 => "G98",
            Self::Gasoline98E10 => "G98E10",
            Self::DieselA => "GOA",
            Self::DieselPremium => "GOAPREMIUM",
            Self::DieselB => "GOB",
            Self::Lpg => "GLP",
            Self::CompressedNaturalGas => "GNC",
            Self::LiquefiedNaturalGas => "GNL",
            Self::Hydrogen => "H2",
        }
    }

    /// Human readable name, used in the sensor display name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gasoline95 => "Gasolina 95 E5",
            Self::Gasoline95E10 => "Gasolina 95 E10",
            Self::Gasoline95Premium => "Gasolina 95 E5 Premium",
            Self::Gasoline98 => "Gasolina 98 E5",
            Self::Gasoline98E10 => "Gasolina 98 E10",
            Self::DieselA => "Gasóleo A",
            Self::DieselPremium => "Gasóleo Premium",
            Self::DieselB => "Gasóleo B",
            Self::Lpg => "GLP",
            Self::CompressedNaturalGas => "Gas Natural Comprimido",
            Self::LiquefiedNaturalGas => "Gas Natural Licuado",
            Self::Hydrogen => "Hidrógeno",
        }
    }

    /// Name of the price field in an upstream station record
    pub fn upstream_field(self) -> &'static str {
        match self {
            Self::Gasoline95 => "Precio Gasolina 95 E5",
            Self::Gasoline95E10 => "Precio Gasolina 95 E10",
            Self::Gasoline95Premium => "Precio Gasolina 95 E5 Premium",
            Self::Gasoline98 => "Precio Gasolina 98 E5",
            Self::Gasoline98E10 => "Precio Gasolina 98 E10",
            Self::DieselA => "Precio Gasoleo A",
            Self::DieselPremium => "Precio Gasoleo Premium",
            Self::DieselB => "Precio Gasoleo B",
            Self::Lpg => "Precio Gases licuados del petróleo",
            Self::CompressedNaturalGas => "Precio Gas Natural Comprimido",
            Self::LiquefiedNaturalGas => "Precio Gas Natural Licuado",
            Self::Hydrogen => "Precio Hidrogeno",
        }
    }

    /// Look up a configuration key, ignoring case and surrounding whitespace
    pub fn from_key(key: &str) -> Option<Self> {
        let wanted = key.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FuelType {
    type Err = EessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| {
            let known: Vec<&str> = Self::ALL.iter().map(|f| f.key()).collect();
            EessError::validation(
                "fuel_type",
                format!("unknown fuel type '{}', expected one of {}", s.trim(), known.join(", ")),
            )
        })
    }
}

impl Serialize for FuelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for FuelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
