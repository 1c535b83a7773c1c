use crate::error::{EessError, Result};
use tracing::Level;

/// Parse a configured level name (case-insensitive; WARNING is accepted)
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(EessError::config(format!("Invalid log level: {level_str}"))),
    }
}

/// Default filter directive when `RUST_LOG` is unset
pub fn default_directive(level: Level) -> String {
    format!(
        "eess_prices={},tower_http=warn,hyper=warn,reqwest=warn",
        level.as_str().to_lowercase()
    )
}
