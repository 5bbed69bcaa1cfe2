//! Common network device types
//!
//! Public platform identifiers accepted by the network modules and the
//! HTTP transport selector for API-driven platforms.

use crate::device::DeviceType;
use crate::modules::ModuleError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Transport Types
// ============================================================================

/// Transport for HTTP-based management APIs (NX-API, eAPI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiTransport {
    /// Plain HTTP
    Http,
    /// HTTP over TLS (default)
    #[default]
    Https,
}

impl ApiTransport {
    /// Accepted parameter values
    pub const CHOICES: [&'static str; 2] = ["http", "https"];

    /// Port used when the caller does not give one
    pub fn default_port(&self) -> u16 {
        match self {
            ApiTransport::Http => 80,
            ApiTransport::Https => 443,
        }
    }
}

impl std::fmt::Display for ApiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiTransport::Http => write!(f, "http"),
            ApiTransport::Https => write!(f, "https"),
        }
    }
}

impl std::str::FromStr for ApiTransport {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(ApiTransport::Http),
            "https" => Ok(ApiTransport::Https),
            _ => Err(ModuleError::InvalidParameter(format!(
                "value of transport must be one of: {}, got: {}",
                Self::CHOICES.join(", "),
                s
            ))),
        }
    }
}

// ============================================================================
// Device Platform Types
// ============================================================================

/// Platforms the reboot module can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkPlatform {
    /// Cisco NX-OS via NX-API
    CiscoNxosNxapi,
    /// Arista EOS via eAPI
    AristaEosEapi,
    /// Cisco IOS via SSH
    CiscoIos,
}

impl NetworkPlatform {
    /// Accepted parameter values
    pub const CHOICES: [&'static str; 3] = ["cisco_nxos_nxapi", "arista_eos_eapi", "cisco_ios"];

    /// Public platform identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkPlatform::CiscoNxosNxapi => "cisco_nxos_nxapi",
            NetworkPlatform::AristaEosEapi => "arista_eos_eapi",
            NetworkPlatform::CiscoIos => "cisco_ios",
        }
    }

    /// Device-layer key for this platform
    pub fn device_type(&self) -> DeviceType {
        match self {
            NetworkPlatform::CiscoNxosNxapi => DeviceType::CiscoNxosNxapi,
            NetworkPlatform::AristaEosEapi => DeviceType::AristaEosEapi,
            NetworkPlatform::CiscoIos => DeviceType::CiscoIosSsh,
        }
    }
}

impl std::fmt::Display for NetworkPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NetworkPlatform {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cisco_nxos_nxapi" => Ok(NetworkPlatform::CiscoNxosNxapi),
            "arista_eos_eapi" => Ok(NetworkPlatform::AristaEosEapi),
            "cisco_ios" => Ok(NetworkPlatform::CiscoIos),
            _ => Err(ModuleError::InvalidParameter(format!(
                "value of platform must be one of: {}, got: {}",
                Self::CHOICES.join(", "),
                s
            ))),
        }
    }
}
