//! Arista EOS device over eAPI.
//!
//! eAPI is JSON-RPC 2.0 posted to `/command-api`. Every request runs in a
//! fresh CLI session, so privileged mode is entered in the same `runCmds`
//! call as the reload.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{api_port, Device, DeviceError, DeviceOptions, DeviceResult, DeviceSettings, DeviceType};
use crate::modules::network::ApiTransport;

// ============================================================================
// eAPI Types
// ============================================================================

/// eAPI JSON-RPC request format
#[derive(Debug, Serialize)]
struct EapiRequest {
    jsonrpc: String,
    method: String,
    params: EapiParams,
    id: String,
}

#[derive(Debug, Serialize)]
struct EapiParams {
    version: u32,
    cmds: Vec<EapiCommand>,
    format: String,
}

/// eAPI command - a plain string, or an object when the command needs input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum EapiCommand {
    Simple(String),
    Complex { cmd: String, input: String },
}

impl From<&str> for EapiCommand {
    fn from(s: &str) -> Self {
        EapiCommand::Simple(s.to_string())
    }
}

/// eAPI JSON-RPC response format
#[derive(Debug, Deserialize)]
struct EapiResponse {
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<EapiError>,
}

#[derive(Debug, Deserialize)]
struct EapiError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Vec<EapiErrorData>>,
}

#[derive(Debug, Deserialize)]
struct EapiErrorData {
    #[serde(default)]
    errors: Vec<String>,
}

impl EapiError {
    fn into_device_error(self) -> DeviceError {
        let details = self
            .data
            .map(|d| {
                d.iter()
                    .flat_map(|ed| ed.errors.iter())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let message = if details.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, details)
        };

        DeviceError::Api {
            code: self.code.to_string(),
            message,
        }
    }
}

/// Build the command list for a reboot
fn reboot_commands(secret: Option<&str>) -> Vec<EapiCommand> {
    let enable = match secret {
        Some(secret) => EapiCommand::Complex {
            cmd: "enable".to_string(),
            input: secret.to_string(),
        },
        None => EapiCommand::from("enable"),
    };
    vec![enable, EapiCommand::from("reload now")]
}

// ============================================================================
// Device
// ============================================================================

/// EOS switch reachable over eAPI
pub struct EosDevice {
    identifier: String,
    url: String,
    username: String,
    password: String,
    secret: Option<String>,
    transport: ApiTransport,
    settings: DeviceSettings,
    client: Option<Client>,
}

impl EosDevice {
    pub fn new(
        host: &str,
        username: &str,
        password: &str,
        options: &DeviceOptions,
        settings: &DeviceSettings,
    ) -> Self {
        let transport = options.transport.unwrap_or_default();
        let port = api_port(transport, options.port);

        Self {
            identifier: format!("{}@{}:{}", username, host, port),
            url: format!("{}://{}:{}/command-api", transport, host, port),
            username: username.to_string(),
            password: password.to_string(),
            secret: options.secret.clone(),
            transport,
            settings: settings.clone(),
            client: None,
        }
    }

    /// Endpoint the requests are posted to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_client(&self) -> DeviceResult<Client> {
        let builder = Client::builder().timeout(self.settings.timeout_duration());

        let client = if self.transport == ApiTransport::Https && !self.settings.validate_certs {
            builder.danger_accept_invalid_certs(true).build()
        } else {
            builder.build()
        };

        client.map_err(|e| DeviceError::Http(format!("Failed to create HTTP client: {}", e)))
    }

    async fn run_cmds(
        &self,
        client: &Client,
        commands: Vec<EapiCommand>,
    ) -> DeviceResult<Vec<serde_json::Value>> {
        let request = EapiRequest {
            jsonrpc: "2.0".to_string(),
            method: "runCmds".to_string(),
            params: EapiParams {
                version: 1,
                cmds: commands,
                format: "text".to_string(),
            },
            id: uuid::Uuid::new_v4().to_string(),
        };

        let response = client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DeviceError::AuthenticationFailed(format!(
                "eAPI rejected credentials for {}",
                self.identifier
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceError::Api {
                code: status.as_u16().to_string(),
                message: body,
            });
        }

        let eapi_response: EapiResponse = response.json().await.map_err(|e| {
            DeviceError::InvalidResponse(format!("Failed to parse eAPI response: {}", e))
        })?;

        if let Some(error) = eapi_response.error {
            return Err(error.into_device_error());
        }

        eapi_response
            .result
            .ok_or_else(|| DeviceError::InvalidResponse("eAPI returned no result".to_string()))
    }
}

#[async_trait]
impl Device for EosDevice {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::AristaEosEapi
    }

    async fn open(&mut self) -> DeviceResult<()> {
        debug!(device = %self.identifier, url = %self.url, "Opening eAPI session");
        self.client = Some(self.build_client()?);
        Ok(())
    }

    async fn reboot(&mut self, confirm: bool, timer: Option<u32>) -> DeviceResult<()> {
        if !confirm {
            return Err(DeviceError::RebootNotConfirmed);
        }
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| DeviceError::NotOpen(self.identifier.clone()))?;

        if let Some(minutes) = timer {
            debug!(device = %self.identifier, minutes, "eAPI reload ignores timer");
        }

        info!(device = %self.identifier, "Sending reload via eAPI");
        self.run_cmds(client, reboot_commands(self.secret.as_deref()))
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> DeviceResult<()> {
        debug!(device = %self.identifier, "Closing eAPI session");
        self.client = None;
        Ok(())
    }
}
