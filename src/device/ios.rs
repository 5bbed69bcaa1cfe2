//! Cisco IOS device over SSH.
//!
//! IOS has no management API, so the reboot drives an interactive shell:
//! the device answers `reload` with prompts that have to be acknowledged
//! on the same channel. Reads are timing based: a response is complete
//! once the device has been quiet for [`SETTLE_WINDOW`].

use async_trait::async_trait;
use russh::client::{Handle, Handler, Msg};
use russh::keys::key::PublicKey;
use russh::{Channel, ChannelMsg};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::{Device, DeviceError, DeviceOptions, DeviceResult, DeviceSettings, DeviceType};

/// Default SSH port
const DEFAULT_SSH_PORT: u16 = 22;

/// Quiet period after which a response is considered complete
const SETTLE_WINDOW: Duration = Duration::from_millis(1500);

/// Marker IOS prints when running config differs from startup config
const SAVE_PROMPT_MARKER: &str = "System configuration has been modified";

// ============================================================================
// CLI helpers
// ============================================================================

/// Privilege level inferred from the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptMode {
    /// `router>`
    User,
    /// `router#`
    Privileged,
}

/// Inspect the last non-empty line of `output` for a CLI prompt
fn prompt_mode(output: &str) -> Option<PromptMode> {
    let last = output.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
    if last.ends_with('#') {
        Some(PromptMode::Privileged)
    } else if last.ends_with('>') {
        Some(PromptMode::User)
    } else {
        None
    }
}

/// Command that schedules or triggers the reload.
///
/// A zero timer means reload now, matching IOS where `reload in 0` is
/// rejected.
fn reload_command(timer: Option<u32>) -> String {
    match timer {
        Some(minutes) if minutes > 0 => format!("reload in {}", minutes),
        _ => "reload".to_string(),
    }
}

/// Whether the device asks to save the configuration before reloading
fn asks_to_save(output: &str) -> bool {
    output.contains(SAVE_PROMPT_MARKER)
}

/// First `% ...` error line in CLI output, if any
fn cli_error(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("% "))
        .map(|l| l.trim_start_matches("% ").to_string())
}

/// Fail when the device rejected the last command
fn reject_cli_error(output: &str) -> DeviceResult<()> {
    match cli_error(output) {
        Some(message) => Err(DeviceError::Api {
            code: "cli".to_string(),
            message,
        }),
        None => Ok(()),
    }
}

// ============================================================================
// SSH plumbing
// ============================================================================

/// Russh error wrapper required by the `Handler` trait
#[derive(Debug)]
struct SshHandlerError(russh::Error);

impl From<russh::Error> for SshHandlerError {
    fn from(err: russh::Error) -> Self {
        SshHandlerError(err)
    }
}

impl std::fmt::Display for SshHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Russh error: {}", self.0)
    }
}

impl std::error::Error for SshHandlerError {}

impl From<russh::Error> for DeviceError {
    fn from(err: russh::Error) -> Self {
        DeviceError::Ssh(err.to_string())
    }
}

/// Client handler with optional known_hosts verification
struct ClientHandler {
    host: String,
    port: u16,
    host_key_checking: bool,
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = SshHandlerError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        if !self.host_key_checking {
            trace!(host = %self.host, "Host key checking disabled, accepting key");
            return Ok(true);
        }

        match russh::keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => {
                debug!(host = %self.host, "Host key verified against known_hosts");
                Ok(true)
            }
            Ok(false) => {
                warn!(host = %self.host, "Host not found in known_hosts, rejecting");
                Ok(false)
            }
            Err(e) => {
                warn!(
                    host = %self.host,
                    error = %e,
                    "HOST KEY VERIFICATION FAILED! Server key does not match known_hosts entry."
                );
                Ok(false)
            }
        }
    }
}

/// An open interactive shell
struct ShellSession {
    handle: Handle<ClientHandler>,
    channel: Channel<Msg>,
}

impl ShellSession {
    async fn send(&mut self, line: &str) -> DeviceResult<()> {
        trace!(line = %line, "Sending CLI line");
        let data = format!("{}\n", line);
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(|e| DeviceError::Ssh(format!("Failed to write to channel: {}", e)))
    }

    /// Read until the device goes quiet, the channel closes, or `timeout`.
    async fn read_settled(&mut self, timeout: Duration) -> DeviceResult<String> {
        let deadline = Instant::now() + timeout;
        let mut output = Vec::new();

        loop {
            match tokio::time::timeout(SETTLE_WINDOW, self.channel.wait()).await {
                Ok(Some(ChannelMsg::Data { ref data })) => output.extend_from_slice(data),
                Ok(Some(ChannelMsg::ExtendedData { ref data, .. })) => {
                    output.extend_from_slice(data)
                }
                Ok(Some(ChannelMsg::Eof)) | Ok(Some(ChannelMsg::Close)) | Ok(None) => break,
                Ok(Some(_)) => {}
                Err(_) if !output.is_empty() => break,
                Err(_) => {
                    if Instant::now() >= deadline {
                        return Err(DeviceError::Timeout(timeout.as_secs()));
                    }
                }
            }
        }

        let text = String::from_utf8_lossy(&output).to_string();
        trace!(output = %text, "CLI output settled");
        Ok(text)
    }

    /// Read until a prompt shows up at the end of the output
    async fn read_prompt(&mut self, timeout: Duration) -> DeviceResult<(String, PromptMode)> {
        let deadline = Instant::now() + timeout;
        let mut collected = String::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DeviceError::Timeout(timeout.as_secs()));
            }
            let chunk = self.read_settled(remaining).await?;
            if chunk.is_empty() {
                return Err(DeviceError::ConnectionFailed(
                    "Channel closed before a prompt was received".to_string(),
                ));
            }
            collected.push_str(&chunk);
            if let Some(mode) = prompt_mode(&collected) {
                return Ok((collected, mode));
            }
        }
    }
}

// ============================================================================
// Device
// ============================================================================

/// IOS router or switch reachable over SSH
pub struct IosDevice {
    identifier: String,
    host: String,
    port: u16,
    username: String,
    password: String,
    secret: Option<String>,
    settings: DeviceSettings,
    session: Option<ShellSession>,
}

impl IosDevice {
    pub fn new(
        host: &str,
        username: &str,
        password: &str,
        options: &DeviceOptions,
        settings: &DeviceSettings,
    ) -> Self {
        let port = options.port.unwrap_or(DEFAULT_SSH_PORT);
        if options.transport.is_some() {
            debug!(host = %host, "transport option does not apply to SSH devices, ignoring");
        }

        Self {
            identifier: format!("{}@{}:{}", username, host, port),
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            secret: options.secret.clone(),
            settings: settings.clone(),
            session: None,
        }
    }

    async fn connect(&self) -> DeviceResult<Handle<ClientHandler>> {
        let timeout = self.settings.timeout_duration();

        let mut config = russh::client::Config::default();
        config.inactivity_timeout = Some(timeout);
        let config = Arc::new(config);

        let addr = format!("{}:{}", self.host, self.port);
        let socket = tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&addr))
            .await
            .map_err(|_| DeviceError::Timeout(self.settings.timeout))?
            .map_err(|e| {
                DeviceError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
            })?;

        socket.set_nodelay(true).map_err(|e| {
            DeviceError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        let handler = ClientHandler {
            host: self.host.clone(),
            port: self.port,
            host_key_checking: self.settings.host_key_checking,
        };

        let mut handle = russh::client::connect_stream(config, socket, handler)
            .await
            .map_err(|e| DeviceError::ConnectionFailed(format!("SSH handshake failed: {}", e)))?;

        let authenticated = handle
            .authenticate_password(&self.username, &self.password)
            .await
            .map_err(|e| {
                DeviceError::AuthenticationFailed(format!("Password authentication failed: {}", e))
            })?;

        if !authenticated {
            return Err(DeviceError::AuthenticationFailed(format!(
                "Password rejected for {}",
                self.identifier
            )));
        }

        Ok(handle)
    }

    async fn enable(&self, shell: &mut ShellSession) -> DeviceResult<()> {
        let timeout = self.settings.timeout_duration();
        let Some(secret) = self.secret.as_deref() else {
            warn!(
                device = %self.identifier,
                "Device is in user mode and no secret was given; reload may be refused"
            );
            return Ok(());
        };

        shell.send("enable").await?;
        let answer = shell.read_settled(timeout).await?;
        let mode = if answer.to_lowercase().contains("password") {
            shell.send(secret).await?;
            shell.read_prompt(timeout).await?.1
        } else {
            prompt_mode(&answer).unwrap_or(PromptMode::User)
        };

        if mode != PromptMode::Privileged {
            return Err(DeviceError::AuthenticationFailed(
                "enable secret rejected".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Device for IosDevice {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::CiscoIosSsh
    }

    async fn open(&mut self) -> DeviceResult<()> {
        debug!(device = %self.identifier, "Opening SSH session");
        let timeout = self.settings.timeout_duration();

        let handle = self.connect().await?;
        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| DeviceError::Ssh(format!("Failed to open channel: {}", e)))?;

        channel
            .request_pty(false, "vt100", 511, 24, 0, 0, &[])
            .await
            .map_err(|e| DeviceError::Ssh(format!("Failed to request PTY: {}", e)))?;
        channel
            .request_shell(true)
            .await
            .map_err(|e| DeviceError::Ssh(format!("Failed to start shell: {}", e)))?;

        let mut shell = ShellSession { handle, channel };

        let (_, mode) = shell.read_prompt(timeout).await?;
        if mode == PromptMode::User {
            self.enable(&mut shell).await?;
        }

        shell.send("terminal length 0").await?;
        shell.read_prompt(timeout).await?;

        self.session = Some(shell);
        Ok(())
    }

    async fn reboot(&mut self, confirm: bool, timer: Option<u32>) -> DeviceResult<()> {
        if !confirm {
            return Err(DeviceError::RebootNotConfirmed);
        }
        let timeout = self.settings.timeout_duration();
        let shell = self
            .session
            .as_mut()
            .ok_or_else(|| DeviceError::NotOpen(self.identifier.clone()))?;

        let command = reload_command(timer);
        info!(device = %self.identifier, command = %command, "Sending reload via SSH");

        shell.send(&command).await?;
        let mut response = shell.read_settled(timeout).await?;
        reject_cli_error(&response)?;

        if asks_to_save(&response) {
            debug!(device = %self.identifier, "Declining to save configuration before reload");
            shell.send("no").await?;
            response = shell.read_settled(timeout).await?;
            reject_cli_error(&response)?;
        }
        trace!(response = %response, "Reload prompt");

        // Accept "Proceed with reload? [confirm]"
        shell.send("").await?;
        if let Err(e) = shell.read_settled(SETTLE_WINDOW).await {
            debug!(device = %self.identifier, error = %e, "No output after reload confirmation");
        }
        Ok(())
    }

    async fn close(&mut self) -> DeviceResult<()> {
        debug!(device = %self.identifier, "Closing SSH session");
        if let Some(shell) = self.session.take() {
            let _ = shell.channel.eof().await;
            shell
                .handle
                .disconnect(russh::Disconnect::ByApplication, "Connection closed by client", "en")
                .await?;
        }
        Ok(())
    }
}
