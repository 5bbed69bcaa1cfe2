//! ntc-reboot - reboot network devices from the command line
//!
//! Runs the `ntc_reboot` module once and prints its result. Exit status is
//! 0 on success, 1 when the module fails, 2 on usage or configuration
//! errors.

mod cli;

use cli::output::OutputFormatter;
use cli::Cli;
use ntc_reboot::config::Config;
use ntc_reboot::device::NativeDeviceFactory;
use ntc_reboot::modules::network::NtcRebootModule;
use ntc_reboot::modules::{Module, ModuleContext, ModuleOutput, ModuleRegistry, ParamExt};
use ntc_reboot::telemetry;
use std::sync::Arc;
use tracing::debug;

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();
    let output = OutputFormatter::new(!cli.no_color, cli.is_json());

    // Load configuration
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            output.failure("localhost", &format!("{:#}", e));
            std::process::exit(2);
        }
    };

    // Initialize logging based on verbosity and config
    let mut logging = config.logging.clone();
    logging.ansi_colors = logging.ansi_colors && !cli.no_color;
    if let Err(e) = telemetry::init_from_verbosity(&logging, cli.verbosity()) {
        eprintln!("Warning: {}", e);
    }
    debug!(version = VERSION, "ntc-reboot starting");

    let params = match cli.module_params() {
        Ok(params) => params,
        Err(e) => {
            output.failure("localhost", &e.to_string());
            std::process::exit(e.exit_code());
        }
    };
    let host = params
        .get_string("host")
        .ok()
        .flatten()
        .unwrap_or_else(|| "localhost".to_string());

    let context = ModuleContext::new()
        .with_check_mode(cli.check_mode)
        .with_device_factory(Arc::new(NativeDeviceFactory::new(config.device_settings())));

    let exit_code = match run(&params, &context) {
        Ok(result) => {
            output.result(&host, &result);
            0
        }
        Err(e) => {
            output.failure(&host, &e.to_string());
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

/// Run the reboot module once
fn run(
    params: &ntc_reboot::modules::ModuleParams,
    context: &ModuleContext,
) -> ntc_reboot::error::Result<ModuleOutput> {
    let registry = ModuleRegistry::with_builtins();
    Ok(registry.execute(NtcRebootModule.name(), params, context)?)
}
