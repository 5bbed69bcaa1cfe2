//! Cisco NX-OS device over NX-API.
//!
//! NX-API accepts CLI input wrapped in an `ins_api` JSON envelope posted to
//! `/ins`. The reboot issues `terminal dont-ask` first so `reload` does not
//! stop at the interactive confirmation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{api_port, Device, DeviceError, DeviceOptions, DeviceResult, DeviceSettings, DeviceType};
use crate::modules::network::ApiTransport;

/// Commands sent for a reboot, in order
const REBOOT_COMMANDS: [&str; 2] = ["terminal dont-ask", "reload"];

// ============================================================================
// NX-API Types
// ============================================================================

/// NX-API request format
#[derive(Debug, Serialize)]
struct NxApiRequest {
    ins_api: NxApiInsApi,
}

#[derive(Debug, Serialize)]
struct NxApiInsApi {
    version: String,
    #[serde(rename = "type")]
    req_type: String,
    chunk: String,
    sid: String,
    input: String,
    output_format: String,
}

impl NxApiRequest {
    fn cli_show_ascii(commands: &[&str]) -> Self {
        Self {
            ins_api: NxApiInsApi {
                version: "1.0".to_string(),
                req_type: "cli_show_ascii".to_string(),
                chunk: "0".to_string(),
                sid: "1".to_string(),
                input: commands.join(" ; "),
                output_format: "json".to_string(),
            },
        }
    }
}

/// NX-API response format
#[derive(Debug, Deserialize)]
struct NxApiResponse {
    ins_api: NxApiInsApiResponse,
}

#[derive(Debug, Deserialize)]
struct NxApiInsApiResponse {
    outputs: NxApiOutputs,
}

#[derive(Debug, Deserialize)]
struct NxApiOutputs {
    output: NxApiOutputWrapper,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NxApiOutputWrapper {
    Single(NxApiOutput),
    Multiple(Vec<NxApiOutput>),
}

#[derive(Debug, Deserialize)]
struct NxApiOutput {
    code: String,
    msg: String,
}

impl NxApiOutputWrapper {
    fn into_vec(self) -> Vec<NxApiOutput> {
        match self {
            NxApiOutputWrapper::Single(out) => vec![out],
            NxApiOutputWrapper::Multiple(outs) => outs,
        }
    }
}

// ============================================================================
// Device
// ============================================================================

/// NX-OS switch reachable over NX-API
pub struct NxosDevice {
    identifier: String,
    url: String,
    username: String,
    password: String,
    transport: ApiTransport,
    settings: DeviceSettings,
    client: Option<Client>,
}

impl NxosDevice {
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
            url: format!("{}://{}:{}/ins", transport, host, port),
            username: username.to_string(),
            password: password.to_string(),
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

        let builder = if self.transport == ApiTransport::Https && !self.settings.validate_certs {
            builder.danger_accept_invalid_certs(true)
        } else {
            builder
        };

        builder
            .build()
            .map_err(|e| DeviceError::Http(format!("Failed to create HTTP client: {}", e)))
    }

    async fn send(&self, client: &Client, commands: &[&str]) -> DeviceResult<Vec<NxApiOutput>> {
        let request = NxApiRequest::cli_show_ascii(commands);

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
                "NX-API rejected credentials for {}",
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

        let api_response: NxApiResponse = response.json().await.map_err(|e| {
            DeviceError::InvalidResponse(format!("Failed to parse NX-API response: {}", e))
        })?;

        let outputs = api_response.ins_api.outputs.output.into_vec();
        if let Some(failed) = outputs.iter().find(|o| o.code != "200") {
            return Err(DeviceError::Api {
                code: failed.code.clone(),
                message: failed.msg.clone(),
            });
        }

        Ok(outputs)
    }
}

#[async_trait]
impl Device for NxosDevice {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::CiscoNxosNxapi
    }

    async fn open(&mut self) -> DeviceResult<()> {
        debug!(device = %self.identifier, url = %self.url, "Opening NX-API session");
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
            debug!(device = %self.identifier, minutes, "NX-API reload ignores timer");
        }

        info!(device = %self.identifier, "Sending reload via NX-API");
        self.send(client, &REBOOT_COMMANDS).await?;
        Ok(())
    }

    async fn close(&mut self) -> DeviceResult<()> {
        debug!(device = %self.identifier, "Closing NX-API session");
        self.client = None;
        Ok(())
    }
}
