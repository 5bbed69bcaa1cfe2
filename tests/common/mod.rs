//! Shared test utilities for the ntc-reboot test suite.
//!
//! This module provides:
//! - A recording [`DeviceFactory`] and [`Device`] that log every call
//! - Failure injection for open/reboot/close
//! - Parameter builders
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ntc_reboot::device::{
    Device, DeviceError, DeviceFactory, DeviceOptions, DeviceResult, DeviceType,
};
use ntc_reboot::modules::{ModuleContext, ModuleParams};

/// One call observed by the recording factory or its devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        device_type: DeviceType,
        host: String,
        username: String,
        password: String,
        options: DeviceOptions,
    },
    Open,
    Reboot {
        confirm: bool,
        timer: Option<u32>,
    },
    Close,
}

/// Which device operation should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Open,
    Reboot,
    Close,
}

/// Device factory that records calls instead of touching the network
#[derive(Default)]
pub struct RecordingFactory {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_at: Vec<FailAt>,
    unavailable: Vec<DeviceType>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given device operation fail
    pub fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at.push(fail_at);
        self
    }

    /// Report the given device type as not available
    pub fn without(mut self, device_type: DeviceType) -> Self {
        self.unavailable.push(device_type);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made on devices, without the create call
    pub fn device_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Create { .. }))
            .collect()
    }

    pub fn created(&self) -> Vec<(DeviceType, DeviceOptions)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create {
                    device_type,
                    options,
                    ..
                } => Some((device_type, options)),
                _ => None,
            })
            .collect()
    }
}

impl DeviceFactory for RecordingFactory {
    fn availability(&self, device_type: DeviceType) -> Result<(), String> {
        if self.unavailable.contains(&device_type) {
            Err("disabled in test".to_string())
        } else {
            Ok(())
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
        self.calls.lock().unwrap().push(Call::Create {
            device_type,
            host: host.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            options: options.clone(),
        });

        Ok(Box::new(RecordingDevice {
            identifier: format!("{}@{}", username, host),
            device_type,
            calls: self.calls.clone(),
            fail_at: self.fail_at.clone(),
        }))
    }
}

/// Device handle that records calls
pub struct RecordingDevice {
    identifier: String,
    device_type: DeviceType,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_at: Vec<FailAt>,
}

impl RecordingDevice {
    fn record(&self, call: Call, op: FailAt) -> DeviceResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_at.contains(&op) {
            return Err(match op {
                FailAt::Open => DeviceError::ConnectionFailed(format!(
                    "Connection refused by {}",
                    self.identifier
                )),
                FailAt::Reboot => DeviceError::Api {
                    code: "1002".to_string(),
                    message: "CLI command 2 of 2 'reload now' failed".to_string(),
                },
                FailAt::Close => DeviceError::Ssh("channel already closed".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Device for RecordingDevice {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    async fn open(&mut self) -> DeviceResult<()> {
        self.record(Call::Open, FailAt::Open)
    }

    async fn reboot(&mut self, confirm: bool, timer: Option<u32>) -> DeviceResult<()> {
        self.record(Call::Reboot { confirm, timer }, FailAt::Reboot)
    }

    async fn close(&mut self) -> DeviceResult<()> {
        self.record(Call::Close, FailAt::Close)
    }
}

/// Minimal valid parameters for a platform
pub fn reboot_params(platform: &str) -> ModuleParams {
    let mut params = ModuleParams::new();
    params.insert("platform".to_string(), serde_json::json!(platform));
    params.insert("host".to_string(), serde_json::json!("192.0.2.10"));
    params.insert("username".to_string(), serde_json::json!("admin"));
    params.insert("password".to_string(), serde_json::json!("hunter2"));
    params.insert("confirm".to_string(), serde_json::json!(true));
    params
}

/// Module context bound to a recording factory
pub fn context_with(factory: &Arc<RecordingFactory>) -> ModuleContext {
    ModuleContext::new().with_device_factory(factory.clone())
}
