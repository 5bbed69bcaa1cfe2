//! # ntc-reboot - Reboot network devices
//!
//! An Ansible-style module that reboots Cisco NX-OS (NX-API), Arista EOS
//! (eAPI) and Cisco IOS (SSH) devices, usable as a library or through the
//! `ntc-reboot` binary.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 CLI / caller                 │
//! └──────────────────────────────────────────────┘
//!                        │  ModuleParams
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │    ModuleRegistry -> ntc_reboot module       │
//! │  (validate, pick device type, open/reboot)   │
//! └──────────────────────────────────────────────┘
//!                        │  DeviceFactory
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!   ┌────────────┐ ┌────────────┐ ┌────────────┐
//!   │   NX-API   │ │    eAPI    │ │  IOS SSH   │
//!   │ (reqwest)  │ │ (reqwest)  │ │  (russh)   │
//!   └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ntc_reboot::prelude::*;
//!
//! let mut params = ModuleParams::new();
//! params.insert("platform".into(), "arista_eos_eapi".into());
//! params.insert("host".into(), "192.0.2.20".into());
//! params.insert("username".into(), "admin".into());
//! params.insert("password".into(), "admin".into());
//! params.insert("confirm".into(), true.into());
//!
//! let output = ModuleRegistry::with_builtins()
//!     .execute("ntc_reboot", &params, &ModuleContext::new())?;
//! assert!(output.changed);
//! ```
//!
//! ## Feature Flags
//!
//! - `russh` (default): Cisco IOS support over SSH

// Re-export commonly used items in prelude
pub mod prelude {
    //! Commonly needed types for running the reboot module.

    pub use crate::device::{
        Device, DeviceError, DeviceFactory, DeviceOptions, DeviceSettings, DeviceType,
        NativeDeviceFactory,
    };
    pub use crate::error::{Error, Result};
    pub use crate::modules::network::{ApiTransport, NetworkPlatform, NtcRebootModule};
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult,
    };
}

/// Layered configuration (files and environment).
pub mod config;

/// Network device clients.
pub mod device;

/// Crate-level error type.
pub mod error;

/// Module trait, registry and the reboot module.
pub mod modules;

/// Logging setup.
pub mod telemetry;
