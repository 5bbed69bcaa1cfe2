//! Telemetry for ntc-reboot.
//!
//! Structured logging through the `tracing` crate, rendered by
//! `tracing-subscriber` in pretty, compact or JSON form.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ntc_reboot::telemetry::{LogFormat, LoggingBuilder};
//!
//! LoggingBuilder::new().with_format(LogFormat::Json).init()?;
//! tracing::info!(host = %host, "Connecting to device");
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, LogLevel, LoggingConfig};
pub use logging::{init_from_verbosity, LoggingBuilder};
