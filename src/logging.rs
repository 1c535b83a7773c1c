//! Structured logging and tracing
//!
//! Sets up the `tracing` subscriber (console and daily rolling file) and
//! provides a small component-scoped logger that prefixes every event with
//! its context fields.

use crate::config::LoggingConfig;
use crate::error::{EessError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;

pub use level::parse_log_level;

/// Set to force console-only logging (tests, containers)
pub const DISABLE_FILE_LOG_ENV: &str = "EESS_PRICES_DISABLE_FILE_LOG";

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging system based on configuration
///
/// Only the first call installs a subscriber; later calls report the outcome
/// of that first attempt.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let level = parse_log_level(&config.level)?;
            let filter = build_env_filter(level);

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, level);
                return Ok(());
            }

            init_file_logging(config, filter, level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(EessError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level::default_directive(level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os(DISABLE_FILE_LOG_ENV).is_some()
}

fn console_layer<S>(json_format: bool, level: Level) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        layer
            .json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        layer.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, level: Level) {
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(json_format, level))
        .try_init();

    if installed.is_ok() {
        info!("Logging initialized - level: {:?}, console-only", level);
    }
}

fn init_file_logging(config: &LoggingConfig, filter: EnvFilter, level: Level) -> Result<()> {
    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("eess_prices")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build({
            // A path with an extension names a file; rotate inside its directory
            let p = Path::new(&config.file);
            if p.extension().is_some() {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .map_err(|e| EessError::io(format!("Failed to create log file appender: {e}")))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json().with_filter(LevelFilter::from_level(level)).boxed()
        } else {
            base.with_filter(LevelFilter::from_level(level)).boxed()
        }
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let installed = if config.console_output {
        registry
            .with(console_layer(config.json_format, level))
            .try_init()
    } else {
        registry.try_init()
    };
    installed.map_err(|e| EessError::config(format!("Failed to install subscriber: {e}")))?;

    info!(
        "Logging initialized - level: {:?}, file: {}, console: {}",
        level, config.file, config.console_output
    );
    Ok(())
}

/// Context information for log messages
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Component name (e.g., "poller", "upstream", "web")
    pub component: String,

    /// Registry entry the event belongs to
    pub entry_id: Option<String>,

    /// Additional context fields, rendered in insertion order
    pub extra_fields: Vec<(String, String)>,
}

impl LogContext {
    /// Create a new log context
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            entry_id: None,
            extra_fields: Vec::new(),
        }
    }

    /// Set registry entry id
    pub fn with_entry_id(mut self, entry_id: &str) -> Self {
        self.entry_id = Some(entry_id.to_string());
        self
    }

    /// Add extra field
    pub fn with_field(mut self, key: &str, value: String) -> Self {
        self.extra_fields.push((key.to_string(), value));
        self
    }
}

/// Structured logger with context
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context: LogContext,
    fields: String,
}

impl StructuredLogger {
    /// Create a new structured logger with context
    pub fn new(context: LogContext) -> Self {
        let fields = Self::format_fields(&context);
        Self { context, fields }
    }

    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// Log an info message with context
    pub fn info(&self, message: &str) {
        info!(fields = %self.fields, "{}", message);
    }

    /// Log a warning message with context
    pub fn warn(&self, message: &str) {
        warn!(fields = %self.fields, "{}", message);
    }

    /// Log an error message with context
    pub fn error(&self, message: &str) {
        error!(fields = %self.fields, "{}", message);
    }

    /// Log a debug message with context
    pub fn debug(&self, message: &str) {
        debug!(fields = %self.fields, "{}", message);
    }

    fn format_fields(context: &LogContext) -> String {
        let mut fields = vec![format!("component={}", context.component)];

        if let Some(ref entry_id) = context.entry_id {
            fields.push(format!("entry_id={entry_id}"));
        }

        for (key, value) in &context.extra_fields {
            fields.push(format!("{key}={value}"));
        }

        fields.join(",")
    }
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

/// Create a logger with full context
pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context() {
        let context = LogContext::new("poller")
            .with_entry_id("4284_g95")
            .with_field("municipality", "Madrid".to_string());

        assert_eq!(context.component, "poller");
        assert_eq!(context.entry_id.as_deref(), Some("4284_g95"));
        assert_eq!(
            context.extra_fields,
            vec![("municipality".to_string(), "Madrid".to_string())]
        );
    }

    #[test]
    fn test_structured_logger_fields() {
        init_logging(&LoggingConfig::default()).ok();

        let logger = get_logger_with_context(
            LogContext::new("poller")
                .with_entry_id("4284_g95")
                .with_field("fuel", "G95".to_string()),
        );
        assert_eq!(logger.fields, "component=poller,entry_id=4284_g95,fuel=G95");

        // These should not panic
        logger.info("Test info message");
        logger.debug("Test debug message");
        logger.warn("Test warning message");
        logger.error("Test error message");
    }

    #[test]
    fn test_get_logger() {
        let logger = get_logger("web");
        assert_eq!(logger.context().component, "web");
    }
}
