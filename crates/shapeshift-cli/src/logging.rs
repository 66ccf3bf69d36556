//! Logging setup for the Shapeshift CLI
//!
//! The core library logs through the `log` facade; those records are bridged
//! into the `tracing` subscriber installed here, so `-v` and `RUST_LOG`
//! control both.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact or full
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Problems found while building the config, logged once logging is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
            warnings: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {
                config.level = "warn".to_string();
            }
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        // RUST_LOG takes precedence
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("SHAPESHIFT_LOG_FORMAT") {
            self.set_format(&format);
        }
    }

    /// Select the output format by name, keeping the current one if unknown
    pub fn set_format(&mut self, format: &str) {
        match format.to_lowercase().as_str() {
            "compact" => self.format = LogFormat::Compact,
            "full" => self.format = LogFormat::Full,
            _ => self
                .warnings
                .push(format!("Invalid log format: {}, using {:?}", format, self.format)),
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config)?;
    let ansi = config.console && std::io::stderr().is_terminal();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(ansi)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // `try_init` also installs the `log` bridge
    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Full => builder.try_init(),
    };
    installed.map_err(|e| Error::invalid_args(format!("Failed to initialize logging: {}", e)))?;

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(config = ?config, "Logging system initialized");
    Ok(())
}

/// Create environment filter based on configuration
fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.level)
        .map_err(|e| Error::invalid_args(format!("Invalid log filter '{}': {}", config.level, e)))
}
