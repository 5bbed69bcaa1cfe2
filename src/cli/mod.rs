//! CLI module for ntc-reboot
//!
//! This module provides the command-line interface: argument parsing,
//! loading Ansible-style argument files, and turning both into module
//! parameters.

pub mod output;

use clap::{Parser, ValueEnum};
use ntc_reboot::error::{Error, Result};
use ntc_reboot::modules::ModuleParams;
use std::path::{Path, PathBuf};

/// ntc-reboot - Reboot network devices over NX-API, eAPI or SSH
///
/// Parameters can be given as flags, as an Ansible-style arguments file,
/// or both; flags override values from the file.
#[derive(Parser, Debug, Clone)]
#[command(name = "ntc-reboot")]
#[command(author = "Rustible Contributors")]
#[command(version)]
#[command(about = "Reboot a network device", long_about = None)]
pub struct Cli {
    /// Device platform (cisco_nxos_nxapi, arista_eos_eapi, cisco_ios)
    #[arg(long)]
    pub platform: Option<String>,

    /// Hostname or IP address of the device
    #[arg(long)]
    pub host: Option<String>,

    /// Login username
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Login password
    #[arg(short = 'p', long, env = "NTC_REBOOT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Enable secret
    #[arg(long, env = "NTC_REBOOT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// API transport (http or https)
    #[arg(long)]
    pub transport: Option<String>,

    /// TCP port of the management API or SSH server
    #[arg(long)]
    pub port: Option<u16>,

    /// Delay in minutes before the reload (cisco_ios only)
    #[arg(long)]
    pub timer: Option<u32>,

    /// Confirm the reboot; nothing is sent without it
    #[arg(long)]
    pub confirm: bool,

    /// JSON or YAML file with module parameters
    #[arg(short = 'a', long = "args-file")]
    pub args_file: Option<PathBuf>,

    /// Run in check mode (validate only, don't reboot)
    #[arg(long = "check")]
    pub check_mode: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, default_value = "json")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, env = "NTC_REBOOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// Ansible-style JSON result
    #[default]
    Json,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }

    /// Build module parameters from the arguments file and flags
    pub fn module_params(&self) -> Result<ModuleParams> {
        let mut params = match &self.args_file {
            Some(path) => load_args_file(path)?,
            None => ModuleParams::new(),
        };

        let strings = [
            ("platform", &self.platform),
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
            ("secret", &self.secret),
            ("transport", &self.transport),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                params.insert(key.to_string(), serde_json::json!(value));
            }
        }

        if let Some(port) = self.port {
            params.insert("port".to_string(), serde_json::json!(port));
        }
        if let Some(timer) = self.timer {
            params.insert("timer".to_string(), serde_json::json!(timer));
        }
        if self.confirm {
            params.insert("confirm".to_string(), serde_json::json!(true));
        }

        Ok(params)
    }
}

/// Load module parameters from a JSON or YAML file.
///
/// The file must hold a single mapping of parameter names to values.
pub fn load_args_file(path: &Path) -> Result<ModuleParams> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::args_file(path, e.to_string()))?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value: serde_json::Value = match extension {
        "json" => serde_json::from_str(&content)?,
        "yml" | "yaml" => serde_yaml::from_str(&content)?,
        // YAML is a superset of JSON
        _ => serde_yaml::from_str(&content)?,
    };

    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(Error::args_file(
            path,
            format!("expected a mapping of parameters, got: {}", other),
        )),
    }
}
