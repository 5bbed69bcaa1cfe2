//! Output formatting module for ntc-reboot
//!
//! Renders the module result either as the Ansible JSON document on stdout
//! or as a short colored line for humans.

use colored::Colorize;
use ntc_reboot::modules::ModuleOutput;

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            json_mode,
        }
    }

    /// Render a successful module result
    pub fn render_result(&self, host: &str, output: &ModuleOutput) -> String {
        if self.json_mode {
            return serde_json::to_string(output).unwrap_or_else(|e| failure_json(&e.to_string()));
        }

        let (status, plain) = if output.changed {
            ("changed".yellow().to_string(), "changed")
        } else {
            ("ok".green().to_string(), "ok")
        };

        if self.use_color {
            format!("{}: [{}] => {}", status, host.bright_white().bold(), output.msg)
        } else {
            format!("{}: [{}] => {}", plain, host, output.msg)
        }
    }

    /// Render a failure
    pub fn render_failure(&self, host: &str, message: &str) -> String {
        if self.json_mode {
            return failure_json(message);
        }

        if self.use_color {
            format!(
                "{}: [{}] => {}",
                "failed".red().bold(),
                host.bright_white().bold(),
                message
            )
        } else {
            format!("failed: [{}] => {}", host, message)
        }
    }

    /// Print a successful module result to stdout
    pub fn result(&self, host: &str, output: &ModuleOutput) {
        println!("{}", self.render_result(host, output));
    }

    /// Print a failure; JSON goes to stdout for the controller, text to stderr
    pub fn failure(&self, host: &str, message: &str) {
        let rendered = self.render_failure(host, message);
        if self.json_mode {
            println!("{}", rendered);
        } else {
            eprintln!("{}", rendered);
        }
    }
}

fn failure_json(message: &str) -> String {
    serde_json::json!({
        "failed": true,
        "changed": false,
        "msg": message,
    })
    .to_string()
}
