//! Structured logging layer using the tracing crate.
//!
//! Logs always go to stderr so stdout carries only the module result.

use crate::telemetry::config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Builder for constructing a logging layer.
pub struct LoggingBuilder {
    config: LoggingConfig,
}

impl LoggingBuilder {
    /// Create a new logging builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoggingConfig::default(),
        }
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Set the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Set ANSI colors.
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.config.ansi_colors = enabled;
        self
    }

    /// Include target in logs.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.config.with_target = enabled;
        self
    }

    /// Build and initialize the logging layer (global subscriber).
    pub fn init(self) -> crate::error::Result<()> {
        let env_filter = self.build_filter();
        let registry = tracing_subscriber::registry().with(env_filter);

        let result = match self.config.format {
            LogFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_ansi(self.config.ansi_colors)
                        .with_target(self.config.with_target)
                        .with_file(self.config.with_file)
                        .with_line_number(self.config.with_file),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_ansi(self.config.ansi_colors)
                        .with_target(self.config.with_target)
                        .with_file(self.config.with_file)
                        .with_line_number(self.config.with_file),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(self.config.with_target)
                        .with_file(self.config.with_file)
                        .with_line_number(self.config.with_file),
                )
                .try_init(),
        };

        result.map_err(|e| crate::error::Error::Config(e.to_string()))
    }

    fn build_filter(&self) -> EnvFilter {
        let default_filter = self.config.level.to_string();

        if let Some(ref filter) = self.config.filter {
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new(&default_filter))
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter))
        }
    }
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize logging from the configured defaults and the `-v` count.
///
/// A non-zero verbosity raises the configured level; it never lowers it.
pub fn init_from_verbosity(config: &LoggingConfig, verbosity: u8) -> crate::error::Result<()> {
    let mut config = config.clone();
    if verbosity > 0 {
        config.level = config.level.min(LogLevel::from_verbosity(verbosity));
    }
    config.with_target = config.with_target || verbosity >= 2;
    config.with_file = config.with_file || verbosity >= 3;

    LoggingBuilder::from_config(config).init()
}
