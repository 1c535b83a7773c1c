//! Configuration management
//!
//! Handles loading and validation of the YAML configuration file and the
//! binding of per-sensor parameters into immutable [`InstanceConfig`]s.

use crate::error::{EessError, Result};
use crate::fuel::FuelType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

mod defaults;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "EESS_PRICES_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Upstream HTTP client settings
    pub http: HttpConfig,

    /// Poll cadence
    pub poll: PollConfig,

    /// Web API binding
    pub web: WebConfig,

    /// Timezone used to stamp `last_update` ("local" or an IANA name)
    pub timezone: String,

    /// Sensor instances to run
    pub sensors: Vec<SensorConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file; its directory receives the rolling files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Upstream HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Endpoint prefix; the municipality id is appended verbatim
    pub base_url: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent upstream
    pub user_agent: String,
}

/// Poll cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between nominal poll ticks
    pub interval_secs: u64,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Whether to serve the JSON API
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Municipality id as written in the configuration file
///
/// Accepts both `4` and `"4"`; the value is coerced during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MunicipalityIdInput {
    Number(i64),
    Text(String),
}

impl From<i64> for MunicipalityIdInput {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MunicipalityIdInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One configured sensor, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Municipality display name
    pub municipality_name: String,

    /// Municipality id understood by the upstream directory
    pub municipality_id: MunicipalityIdInput,

    /// Fuel type key (see [`FuelType`])
    pub fuel_type: String,
}

/// Positive municipality identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MunicipalityId(u32);

impl MunicipalityId {
    /// Build an id, rejecting zero, negatives and values beyond `u32`
    pub fn new(value: i64) -> Result<Self> {
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(EessError::validation(
                "municipality_id",
                format!("must be a positive integer, got {value}"),
            )),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MunicipalityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated, immutable parameters of one sensor instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceConfig {
    pub municipality_name: String,
    pub municipality_id: MunicipalityId,
    pub fuel_type: FuelType,
}

impl InstanceConfig {
    /// Registry key derived from the upstream identity of the instance
    pub fn entry_id(&self) -> String {
        format!(
            "{}_{}",
            self.municipality_id,
            self.fuel_type.key().to_ascii_lowercase()
        )
    }
}

/// Validate the three sensor parameters and bind them into an [`InstanceConfig`]
pub fn validate_instance(
    municipality_name: &str,
    municipality_id: &MunicipalityIdInput,
    fuel_type_key: &str,
) -> Result<InstanceConfig> {
    let name = municipality_name.trim();
    if name.is_empty() {
        return Err(EessError::validation(
            "municipality_name",
            "cannot be empty",
        ));
    }

    let raw_id = match municipality_id {
        MunicipalityIdInput::Number(n) => *n,
        MunicipalityIdInput::Text(s) => s.trim().parse::<i64>().map_err(|_| {
            EessError::validation(
                "municipality_id",
                format!("'{s}' is not an integer"),
            )
        })?,
    };
    let municipality_id = MunicipalityId::new(raw_id)?;
    let fuel_type = fuel_type_key.parse::<FuelType>()?;

    Ok(InstanceConfig {
        municipality_name: name.to_string(),
        municipality_id,
        fuel_type,
    })
}

impl SensorConfig {
    /// Validate this entry
    pub fn to_instance(&self) -> Result<InstanceConfig> {
        validate_instance(
            &self.municipality_name,
            &self.municipality_id,
            &self.fuel_type,
        )
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `$EESS_PRICES_CONFIG` or the default locations
    pub fn load() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_PATH_ENV) {
            let path = Path::new(&explicit);
            if !path.exists() {
                return Err(EessError::config(format!(
                    "{} points to missing file {}",
                    CONFIG_PATH_ENV,
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        let default_paths = ["eess_prices_config.yaml", "/etc/eess_prices/config.yaml"];
        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration and bind every sensor entry
    pub fn validate(&self) -> Result<Vec<InstanceConfig>> {
        crate::logging::parse_log_level(&self.logging.level)?;

        let base = self.http.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(EessError::validation(
                "http.base_url",
                "must be an http(s) URL",
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(EessError::validation(
                "http.timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.poll.interval_secs == 0 {
            return Err(EessError::validation(
                "poll.interval_secs",
                "must be greater than 0",
            ));
        }
        if self.web.enabled && self.web.port == 0 {
            return Err(EessError::validation("web.port", "must be greater than 0"));
        }
        crate::publisher::SystemClock::from_timezone(&self.timezone)?;

        let mut instances: Vec<InstanceConfig> = Vec::with_capacity(self.sensors.len());
        for (idx, sensor) in self.sensors.iter().enumerate() {
            let instance = sensor.to_instance().map_err(|e| match e {
                EessError::Validation { field, message } => {
                    EessError::validation(format!("sensors[{idx}].{field}"), message)
                }
                other => other,
            })?;
            if instances.iter().any(|i| i.entry_id() == instance.entry_id()) {
                return Err(EessError::validation(
                    format!("sensors[{idx}]"),
                    format!(
                        "duplicate sensor for municipality {} and fuel {}",
                        instance.municipality_id, instance.fuel_type
                    ),
                ));
            }
            instances.push(instance);
        }
        Ok(instances)
    }
}
