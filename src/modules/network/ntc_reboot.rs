//! Network device reboot module
//!
//! Reboots Cisco NX-OS (NX-API), Arista EOS (eAPI) and Cisco IOS (SSH)
//! devices. The module validates its parameters, maps the platform to a
//! device type, asks the device factory for a handle and runs
//! `open -> reboot -> close` on it.
//!
//! # Parameters
//!
//! | Name | Required | Description |
//! |------|----------|-------------|
//! | `platform` | yes | `cisco_nxos_nxapi`, `arista_eos_eapi` or `cisco_ios` |
//! | `host` | yes | Hostname or IP address of the device |
//! | `username` | yes | Login username |
//! | `password` | yes | Login password |
//! | `secret` | no | Enable secret |
//! | `transport` | no | `http` or `https` (API platforms) |
//! | `port` | no | TCP port |
//! | `timer` | no | Delay in minutes before the reload (`cisco_ios` only) |
//! | `confirm` | no | Must be `true`; defaults to `false` |
//!
//! # Example
//!
//! ```yaml
//! - ntc_reboot:
//!     platform: cisco_nxos_nxapi
//!     host: "{{ inventory_hostname }}"
//!     username: "{{ username }}"
//!     password: "{{ password }}"
//!     transport: http
//!     confirm: true
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tracing::{debug, info, warn};

use super::common::{ApiTransport, NetworkPlatform};
use crate::device::{DeviceFactory, DeviceOptions, NativeDeviceFactory};
use crate::modules::{
    check_unsupported_params, Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams,
    ModuleResult, ParamExt,
};

const CONFIRM_REQUIRED: &str = "confirm must be set to true for this module to work.";

/// Parsed module parameters
#[derive(Clone, PartialEq, Eq)]
pub struct RebootParams {
    pub platform: NetworkPlatform,
    pub host: String,
    pub username: String,
    pub password: String,
    pub secret: Option<String>,
    pub transport: Option<ApiTransport>,
    pub port: Option<u16>,
    pub timer: Option<u32>,
    pub confirm: bool,
}

impl std::fmt::Debug for RebootParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebootParams")
            .field("platform", &self.platform)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"********")
            .field("secret", &self.secret.as_ref().map(|_| "********"))
            .field("transport", &self.transport)
            .field("port", &self.port)
            .field("timer", &self.timer)
            .field("confirm", &self.confirm)
            .finish()
    }
}

impl RebootParams {
    /// Parse and type-check the raw parameters.
    ///
    /// Covers required keys, choices and value types. The reboot preconditions
    /// are checked separately by [`RebootParams::validate`].
    pub fn from_params(params: &ModuleParams) -> ModuleResult<Self> {
        let platform: NetworkPlatform = params.get_string_required("platform")?.parse()?;
        let host = params.get_string_required("host")?;
        let username = params.get_string_required("username")?;
        let password = params.get_string_required("password")?;
        let secret = params.get_string("secret")?;

        let transport = params
            .get_string("transport")?
            .map(|t| t.parse::<ApiTransport>())
            .transpose()?;

        let port = params
            .get_i64("port")?
            .map(|p| {
                u16::try_from(p)
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| {
                        ModuleError::InvalidParameter(format!(
                            "port must be between 1 and 65535, got: {}",
                            p
                        ))
                    })
            })
            .transpose()?;

        let timer = params.get_u32("timer")?;
        let confirm = params.get_bool("confirm")?.unwrap_or(false);

        Ok(Self {
            platform,
            host,
            username,
            password,
            secret,
            transport,
            port,
            timer,
            confirm,
        })
    }

    /// Check the reboot preconditions: confirmation, then timer support.
    pub fn validate(&self) -> ModuleResult<()> {
        if !self.confirm {
            return Err(ModuleError::Validation(CONFIRM_REQUIRED.to_string()));
        }

        if self.timer.is_some() && !self.platform.device_type().supports_timer() {
            return Err(ModuleError::Validation(format!(
                "Timer parameter not supported on platform {}.",
                self.platform
            )));
        }

        Ok(())
    }

    /// Options forwarded to the device factory; only supplied keys are set
    pub fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            transport: self.transport,
            port: self.port,
            secret: self.secret.clone(),
        }
    }
}

/// Module for rebooting network devices
pub struct NtcRebootModule;

impl NtcRebootModule {
    fn factory(context: &ModuleContext) -> Arc<dyn DeviceFactory> {
        context
            .device_factory
            .clone()
            .unwrap_or_else(|| Arc::new(NativeDeviceFactory::default()))
    }

    /// Private runtime for callers outside tokio or on a current-thread runtime
    fn local_runtime() -> ModuleResult<Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ModuleError::ExecutionFailed(format!("Failed to start runtime: {}", e)))
    }

    /// Validate everything that can be checked without touching the device
    fn prepare(params: &ModuleParams, factory: &dyn DeviceFactory) -> ModuleResult<RebootParams> {
        let reboot = RebootParams::from_params(params)?;

        let device_type = reboot.platform.device_type();
        factory.availability(device_type).map_err(|reason| {
            ModuleError::MissingDependency(format!(
                "{} support not available: {}",
                device_type, reason
            ))
        })?;

        reboot.validate()?;
        Ok(reboot)
    }

    /// Run the reboot against the device.
    pub async fn execute_async(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        check_unsupported_params(self, params)?;

        let check_mode = context.check_mode || params.get_bool_or("_ansible_check_mode", false);
        let factory = Self::factory(context);
        let reboot = Self::prepare(params, factory.as_ref())?;
        let device_type = reboot.platform.device_type();

        if check_mode {
            return Ok(ModuleOutput::changed(format!(
                "Would reboot {} ({})",
                reboot.host, reboot.platform
            ))
            .with_data("rebooted", serde_json::json!(false)));
        }

        let options = reboot.device_options();
        debug!(
            platform = %reboot.platform,
            device_type = %device_type,
            host = %reboot.host,
            options = ?options.keys(),
            "Dispatching reboot"
        );

        let mut device = factory.create(
            device_type,
            &reboot.host,
            &reboot.username,
            &reboot.password,
            &options,
        )?;

        device.open().await?;

        if let Err(e) = device.reboot(true, reboot.timer).await {
            if let Err(close_err) = device.close().await {
                warn!(
                    device = %device.identifier(),
                    error = %close_err,
                    "Failed to close device after reboot error"
                );
            }
            return Err(e.into());
        }

        device.close().await?;

        info!(device = %device.identifier(), timer = ?reboot.timer, "Reboot issued");

        let msg = match reboot.timer {
            Some(minutes) if minutes > 0 => format!(
                "Reboot of {} scheduled in {} minute(s)",
                reboot.host, minutes
            ),
            _ => format!("Reboot of {} issued", reboot.host),
        };

        Ok(ModuleOutput::changed(msg).with_data("rebooted", serde_json::json!(true)))
    }
}

impl Module for NtcRebootModule {
    fn name(&self) -> &'static str {
        "ntc_reboot"
    }

    fn description(&self) -> &'static str {
        "Reboot a network device over NX-API, eAPI or SSH"
    }

    fn required_params(&self) -> &[&'static str] {
        &["platform", "host", "username", "password"]
    }

    fn optional_params(&self) -> HashMap<&'static str, serde_json::Value> {
        HashMap::from([
            ("secret", serde_json::Value::Null),
            ("transport", serde_json::Value::Null),
            ("port", serde_json::Value::Null),
            ("timer", serde_json::Value::Null),
            ("confirm", serde_json::json!(false)),
        ])
    }

    fn validate_params(&self, params: &ModuleParams) -> ModuleResult<()> {
        check_unsupported_params(self, params)?;
        RebootParams::from_params(params).map(|_| ())
    }

    fn execute(
        &self,
        params: &ModuleParams,
        context: &ModuleContext,
    ) -> ModuleResult<ModuleOutput> {
        // Use the ambient tokio runtime when there is one
        match Handle::try_current() {
            Ok(handle) => std::thread::scope(|s| {
                s.spawn(|| match handle.runtime_flavor() {
                    // The caller's thread is parked in join and cannot drive its own drivers
                    RuntimeFlavor::CurrentThread => {
                        Self::local_runtime()?.block_on(self.execute_async(params, context))
                    }
                    _ => handle.block_on(self.execute_async(params, context)),
                })
                .join()
                .map_err(|_| ModuleError::ExecutionFailed("reboot task panicked".to_string()))?
            }),
            Err(_) => Self::local_runtime()?.block_on(self.execute_async(params, context)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, DeviceError, DeviceResult, DeviceType};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct FakeDevice {
        recorder: Arc<Recorder>,
        fail_reboot: bool,
    }

    #[async_trait]
    impl Device for FakeDevice {
        fn identifier(&self) -> &str {
            "fake"
        }

        fn device_type(&self) -> DeviceType {
            DeviceType::CiscoNxosNxapi
        }

        async fn open(&mut self) -> DeviceResult<()> {
            self.recorder.push("open".into());
            Ok(())
        }

        async fn reboot(&mut self, confirm: bool, timer: Option<u32>) -> DeviceResult<()> {
            self.recorder.push(format!("reboot({}, {:?})", confirm, timer));
            if self.fail_reboot {
                return Err(DeviceError::Api {
                    code: "400".into(),
                    message: "CLI execution error".into(),
                });
            }
            Ok(())
        }

        async fn close(&mut self) -> DeviceResult<()> {
            self.recorder.push("close".into());
            Ok(())
        }
    }

    struct FakeFactory {
        recorder: Arc<Recorder>,
        fail_reboot: bool,
    }

    impl FakeFactory {
        fn new() -> Self {
            Self {
                recorder: Arc::new(Recorder::default()),
                fail_reboot: false,
            }
        }
    }

    impl DeviceFactory for FakeFactory {
        fn create(
            &self,
            device_type: DeviceType,
            host: &str,
            _username: &str,
            _password: &str,
            options: &DeviceOptions,
        ) -> DeviceResult<Box<dyn Device>> {
            self.recorder
                .push(format!("create({}, {}, {:?})", device_type, host, options.keys()));
            Ok(Box::new(FakeDevice {
                recorder: self.recorder.clone(),
                fail_reboot: self.fail_reboot,
            }))
        }
    }

    fn params(entries: serde_json::Value) -> ModuleParams {
        serde_json::from_value(entries).unwrap()
    }

    fn base(platform: &str) -> serde_json::Value {
        serde_json::json!({
            "platform": platform,
            "host": "192.0.2.10",
            "username": "admin",
            "password": "admin",
            "confirm": true,
        })
    }

    fn run(factory: Arc<FakeFactory>, p: &ModuleParams) -> ModuleResult<ModuleOutput> {
        let context = ModuleContext::new().with_device_factory(factory);
        NtcRebootModule.execute(p, &context)
    }

    #[test]
    fn test_parse_full_params() {
        let mut raw = base("cisco_ios");
        raw["secret"] = "enable".into();
        raw["port"] = "2222".into();
        raw["timer"] = 5.into();
        raw["confirm"] = "yes".into();

        let parsed = RebootParams::from_params(&params(raw)).unwrap();
        assert_eq!(parsed.platform, NetworkPlatform::CiscoIos);
        assert_eq!(parsed.port, Some(2222));
        assert_eq!(parsed.timer, Some(5));
        assert!(parsed.confirm);
        assert_eq!(parsed.device_options().keys(), vec!["port", "secret"]);
    }

    #[test]
    fn test_port_out_of_range() {
        let mut raw = base("arista_eos_eapi");
        raw["port"] = 70000.into();
        let err = RebootParams::from_params(&params(raw)).unwrap_err();
        assert!(err.to_string().contains("port must be between 1 and 65535"));
    }

    #[test]
    fn test_confirm_defaults_to_false() {
        let mut raw = base("cisco_nxos_nxapi");
        raw.as_object_mut().unwrap().remove("confirm");
        let factory = Arc::new(FakeFactory::new());

        let err = run(factory.clone(), &params(raw)).unwrap_err();
        assert_eq!(err.to_string(), CONFIRM_REQUIRED);
        assert!(factory.recorder.calls().is_empty());
    }

    #[test]
    fn test_timer_rejected_on_api_platforms() {
        for platform in ["cisco_nxos_nxapi", "arista_eos_eapi"] {
            let mut raw = base(platform);
            raw["timer"] = 0.into();
            let factory = Arc::new(FakeFactory::new());

            let err = run(factory.clone(), &params(raw)).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Timer parameter not supported on platform {}.", platform)
            );
            assert!(factory.recorder.calls().is_empty());
        }
    }

    #[test]
    fn test_confirm_checked_before_timer() {
        let mut raw = base("arista_eos_eapi");
        raw["confirm"] = false.into();
        raw["timer"] = 5.into();

        let err = run(Arc::new(FakeFactory::new()), &params(raw)).unwrap_err();
        assert_eq!(err.to_string(), CONFIRM_REQUIRED);
    }

    #[test]
    fn test_reboot_sequence() {
        let factory = Arc::new(FakeFactory::new());
        let output = run(factory.clone(), &params(base("cisco_nxos_nxapi"))).unwrap();

        assert!(output.changed);
        assert_eq!(output.data["rebooted"], serde_json::json!(true));
        assert_eq!(
            factory.recorder.calls(),
            vec![
                "create(cisco_nxos_nxapi, 192.0.2.10, [])",
                "open",
                "reboot(true, None)",
                "close",
            ]
        );
    }

    #[test]
    fn test_ios_timer_forwarded() {
        let mut raw = base("cisco_ios");
        raw["timer"] = 10.into();
        let factory = Arc::new(FakeFactory::new());

        let output = run(factory.clone(), &params(raw)).unwrap();
        assert_eq!(output.msg, "Reboot of 192.0.2.10 scheduled in 10 minute(s)");
        assert_eq!(factory.recorder.calls()[2], "reboot(true, Some(10))");
        assert!(factory.recorder.calls()[0].starts_with("create(cisco_ios_ssh"));
    }

    #[test]
    fn test_failed_reboot_still_closes() {
        let factory = Arc::new(FakeFactory {
            fail_reboot: true,
            ..FakeFactory::new()
        });

        let err = run(factory.clone(), &params(base("arista_eos_eapi"))).unwrap_err();
        assert_eq!(err.to_string(), "API error 400: CLI execution error");
        assert_eq!(factory.recorder.calls().last().unwrap(), "close");
    }

    #[test]
    fn test_check_mode_does_not_dispatch() {
        let factory = Arc::new(FakeFactory::new());
        let context = ModuleContext::new()
            .with_device_factory(factory.clone())
            .with_check_mode(true);

        let output = NtcRebootModule
            .execute(&params(base("cisco_ios")), &context)
            .unwrap();
        assert!(output.changed);
        assert_eq!(output.data["rebooted"], serde_json::json!(false));
        assert!(factory.recorder.calls().is_empty());
    }

    #[test]
    fn test_ansible_check_mode_key() {
        let mut raw = base("cisco_ios");
        raw["_ansible_check_mode"] = true.into();
        let factory = Arc::new(FakeFactory::new());

        let output = run(factory.clone(), &params(raw)).unwrap();
        assert_eq!(output.data["rebooted"], serde_json::json!(false));
        assert!(factory.recorder.calls().is_empty());
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let mut raw = base("cisco_ios");
        raw["reload_reason"] = "maintenance".into();
        let err = NtcRebootModule.validate_params(&params(raw)).unwrap_err();
        assert!(matches!(err, ModuleError::UnsupportedParameters(_)));
    }

    #[test]
    fn test_missing_dependency() {
        struct NoSsh;

        impl DeviceFactory for NoSsh {
            fn availability(&self, device_type: DeviceType) -> Result<(), String> {
                match device_type {
                    DeviceType::CiscoIosSsh => Err("no SSH client".to_string()),
                    _ => Ok(()),
                }
            }

            fn create(
                &self,
                _device_type: DeviceType,
                _host: &str,
                _username: &str,
                _password: &str,
                _options: &DeviceOptions,
            ) -> DeviceResult<Box<dyn Device>> {
                panic!("create must not be called");
            }
        }

        let context = ModuleContext::new().with_device_factory(Arc::new(NoSsh));
        let err = NtcRebootModule
            .execute(&params(base("cisco_ios")), &context)
            .unwrap_err();
        assert!(matches!(err, ModuleError::MissingDependency(_)));
        assert_eq!(
            err.to_string(),
            "cisco_ios_ssh support not available: no SSH client"
        );
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let mut raw = base("cisco_ios");
        raw["secret"] = "enable-me".into();
        let parsed = RebootParams::from_params(&params(raw)).unwrap();
        let rendered = format!("{:?}", parsed);
        assert!(!rendered.contains("enable-me"));
        assert_eq!(rendered.matches("admin").count(), 1);
    }
}
