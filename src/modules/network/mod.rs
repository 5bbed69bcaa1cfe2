//! Network Device Modules
//!
//! Modules that act on network devices through their management planes.
//!
//! # Supported Platforms
//!
//! - **Cisco NX-OS**: NX-API (`cisco_nxos_nxapi`)
//! - **Arista EOS**: eAPI (`arista_eos_eapi`)
//! - **Cisco IOS/IOS-XE**: SSH CLI (`cisco_ios`)
//!
//! # Example Usage
//!
//! ```yaml
//! - name: Reboot the access switch in five minutes
//!   ntc_reboot:
//!     platform: cisco_ios
//!     host: "{{ inventory_hostname }}"
//!     username: "{{ un }}"
//!     password: "{{ pwd }}"
//!     timer: 5
//!     confirm: true
//! ```
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +-------------------+
//! |   ntc_reboot     |---->|  DeviceFactory    |
//! +------------------+     +-------------------+
//!                                   |
//!                                   v
//!                          +-------------------+
//!                          |   Device          |
//!                          |   - NX-API        |
//!                          |   - eAPI          |
//!                          |   - SSH/CLI       |
//!                          +-------------------+
//! ```

pub mod common;
pub mod ntc_reboot;

pub use common::{ApiTransport, NetworkPlatform};
pub use ntc_reboot::NtcRebootModule;

use super::ModuleRegistry;
use std::sync::Arc;

/// Register all network modules with the registry
pub fn register_network_modules(registry: &mut ModuleRegistry) {
    registry.register(Arc::new(NtcRebootModule));
}
