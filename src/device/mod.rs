//! Device layer for network device reboots.
//!
//! This module provides a small, uniform interface over the three vendor
//! management planes the reboot module talks to:
//!
//! - **NX-API** (Cisco NX-OS): JSON over HTTP/HTTPS
//! - **eAPI** (Arista EOS): JSON-RPC over HTTP/HTTPS
//! - **SSH CLI** (Cisco IOS): interactive shell via `russh`
//!
//! All clients implement the [`Device`] trait and are created through a
//! [`DeviceFactory`], which lets the module layer be exercised without any
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use ntc_reboot::device::{DeviceFactory, DeviceOptions, DeviceType, NativeDeviceFactory};
//!
//! let factory = NativeDeviceFactory::default();
//! let mut device = factory.create(
//!     DeviceType::CiscoNxosNxapi,
//!     "192.0.2.10",
//!     "admin",
//!     "password",
//!     &DeviceOptions::new(),
//! )?;
//!
//! device.open().await?;
//! device.reboot(true, None).await?;
//! device.close().await?;
//! ```

pub mod eos;
#[cfg(feature = "russh")]
pub mod ios;
pub mod nxos;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use eos::EosDevice;
#[cfg(feature = "russh")]
pub use ios::IosDevice;
pub use nxos::NxosDevice;

use crate::modules::network::ApiTransport;

/// Default request/connect timeout in seconds
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Errors raised by device clients.
///
/// The display text of these errors is what the caller sees, so messages
/// carry the vendor's own wording where one is available.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Could not reach the device.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The device rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Operation did not complete within the configured timeout.
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    /// The management API answered with an error.
    #[error("API error {code}: {message}")]
    Api {
        /// Vendor error code (HTTP status, JSON-RPC code, NX-API code)
        code: String,
        /// Vendor error message
        message: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The device answered with something we could not understand.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// An operation was attempted before `open()`.
    #[error("Device {0} is not open")]
    NotOpen(String),

    /// `reboot` was called without confirmation.
    #[error("Reboot not confirmed: set confirm to true to reboot the device")]
    RebootNotConfirmed,

    /// The backend for this device type is not available.
    #[error("{device_type} support not available: {reason}")]
    Unsupported {
        /// Device type that was requested
        device_type: DeviceType,
        /// Why it is unavailable
        reason: String,
    },

    /// SSH protocol error.
    #[error("SSH error: {0}")]
    Ssh(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for DeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DeviceError::Http(format!("request timed out: {}", err))
        } else if err.is_connect() {
            DeviceError::ConnectionFailed(err.to_string())
        } else {
            DeviceError::Http(err.to_string())
        }
    }
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Internal device-type keys understood by the device layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Cisco NX-OS via NX-API
    CiscoNxosNxapi,
    /// Arista EOS via eAPI
    AristaEosEapi,
    /// Cisco IOS via SSH
    CiscoIosSsh,
}

impl DeviceType {
    /// The device-type key as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::CiscoNxosNxapi => "cisco_nxos_nxapi",
            DeviceType::AristaEosEapi => "arista_eos_eapi",
            DeviceType::CiscoIosSsh => "cisco_ios_ssh",
        }
    }

    /// Whether reboot timers are honored by this device type
    pub fn supports_timer(&self) -> bool {
        matches!(self, DeviceType::CiscoIosSsh)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied connection options.
///
/// Each field is `Some` only when the caller explicitly provided it; the
/// device picks its own defaults for the rest.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DeviceOptions {
    /// HTTP or HTTPS (API devices only)
    pub transport: Option<ApiTransport>,
    /// TCP port
    pub port: Option<u16>,
    /// Enable secret
    pub secret: Option<String>,
}

impl DeviceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: ApiTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Names of the options that were supplied
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.transport.is_some() {
            keys.push("transport");
        }
        if self.port.is_some() {
            keys.push("port");
        }
        if self.secret.is_some() {
            keys.push("secret");
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

impl fmt::Debug for DeviceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceOptions")
            .field("transport", &self.transport)
            .field("port", &self.port)
            .field("secret", &self.secret.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Process-wide settings applied to every device the native factory builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Request and connect timeout in seconds
    pub timeout: u64,
    /// Validate TLS certificates on HTTPS transports
    pub validate_certs: bool,
    /// Require SSH host keys to match ~/.ssh/known_hosts
    pub host_key_checking: bool,
}

impl DeviceSettings {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            validate_certs: true,
            host_key_checking: false,
        }
    }
}

/// Resolve the port for an HTTP(S) management API
pub(crate) fn api_port(transport: ApiTransport, port: Option<u16>) -> u16 {
    port.unwrap_or_else(|| transport.default_port())
}

/// A handle to a single network device.
#[async_trait]
pub trait Device: Send + Sync {
    /// Identifier used in logs (`user@host:port`)
    fn identifier(&self) -> &str;

    /// Device type this handle talks to
    fn device_type(&self) -> DeviceType;

    /// Establish whatever session the device needs
    async fn open(&mut self) -> DeviceResult<()>;

    /// Issue the reboot.
    ///
    /// Nothing is sent unless `confirm` is true. `timer` is a delay in
    /// minutes; device types that cannot schedule a reboot ignore it.
    async fn reboot(&mut self, confirm: bool, timer: Option<u32>) -> DeviceResult<()>;

    /// Release the session
    async fn close(&mut self) -> DeviceResult<()>;
}

/// Creates device handles for a device type and credentials.
pub trait DeviceFactory: Send + Sync {
    /// Whether this factory can build handles for `device_type`.
    ///
    /// Returns the reason when it cannot.
    fn availability(&self, device_type: DeviceType) -> Result<(), String> {
        let _ = device_type;
        Ok(())
    }

    /// Build a handle. No network activity happens until `open()`.
    fn create(
        &self,
        device_type: DeviceType,
        host: &str,
        username: &str,
        password: &str,
        options: &DeviceOptions,
    ) -> DeviceResult<Box<dyn Device>>;
}

/// Factory for the built-in device clients.
#[derive(Debug, Clone, Default)]
pub struct NativeDeviceFactory {
    settings: DeviceSettings,
}

impl NativeDeviceFactory {
    pub fn new(settings: DeviceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }
}

impl DeviceFactory for NativeDeviceFactory {
    fn availability(&self, device_type: DeviceType) -> Result<(), String> {
        match device_type {
            DeviceType::CiscoNxosNxapi | DeviceType::AristaEosEapi => Ok(()),
            #[cfg(feature = "russh")]
            DeviceType::CiscoIosSsh => Ok(()),
            #[cfg(not(feature = "russh"))]
            DeviceType::CiscoIosSsh => {
                Err("built without the `russh` feature".to_string())
            }
        }
    }

    fn create(
        &self,
        device_type: DeviceType,
        host: &str,
        username: &str,
        password: &str,
        options: &DeviceOptions,
    ) -> DeviceResult<Box<dyn Device>> {
        self.availability(device_type)
            .map_err(|reason| DeviceError::Unsupported {
                device_type,
                reason,
            })?;

        let device: Box<dyn Device> = match device_type {
            DeviceType::CiscoNxosNxapi => Box::new(NxosDevice::new(
                host,
                username,
                password,
                options,
                &self.settings,
            )),
            DeviceType::AristaEosEapi => Box::new(EosDevice::new(
                host,
                username,
                password,
                options,
                &self.settings,
            )),
            #[cfg(feature = "russh")]
            DeviceType::CiscoIosSsh => Box::new(IosDevice::new(
                host,
                username,
                password,
                options,
                &self.settings,
            )),
            #[cfg(not(feature = "russh"))]
            DeviceType::CiscoIosSsh => {
                return Err(DeviceError::Unsupported {
                    device_type,
                    reason: "built without the `russh` feature".to_string(),
                })
            }
        };

        Ok(device)
    }
}
