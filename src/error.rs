//! Error types for ntc-reboot.
//!
//! Module and device failures keep their own types
//! ([`ModuleError`](crate::modules::ModuleError),
//! [`DeviceError`](crate::device::DeviceError)); this type covers what
//! happens around a module run: configuration and argument files.

use std::path::PathBuf;
use thiserror::Error;

use crate::modules::ModuleError;

/// Result type alias for ntc-reboot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for ntc-reboot.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration problem (bad config file, logging setup).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The arguments file could not be read or is not a parameter mapping.
    #[error("Failed to load arguments file '{path}': {message}")]
    ArgsFile {
        /// Path to the arguments file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The module run failed.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Creates a new arguments file error.
    pub fn args_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArgsFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Module(_) => 1,
            _ => 2,
        }
    }
}
