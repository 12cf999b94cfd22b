//! Image host uploads.
//!
//! Images are posted base64 encoded with an `Authorization: Client-ID <id>`
//! header. A successful response looks like
//! `{"data": {"link": "https://i.example/abc.png"}, "success": true, "status": 200}`.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use super::{ImageUploader, RemoteError};
use crate::config::RemoteConfig;

/// Hosted URL from an upload response body.
pub fn parse_upload_response(response: &Value) -> Result<String, RemoteError> {
    if response.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = response
            .pointer("/data/error")
            .and_then(|error| error.as_str().map(str::to_string).or_else(|| {
                error.get("message").and_then(Value::as_str).map(str::to_string)
            }))
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(RemoteError::UploadRejected(reason));
    }

    response
        .pointer("/data/link")
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RemoteError::Malformed("upload response has no data.link".to_string()))
}

/// Blocking image host client.
#[derive(Debug, Clone)]
pub struct ImageHostClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    client_id: Option<String>,
}

impl ImageHostClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.upload_endpoint.clone(),
            client_id: config
                .upload_client_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some()
    }
}

impl ImageUploader for ImageHostClient {
    fn upload_image(&self, bytes: &[u8]) -> Result<String, RemoteError> {
        let client_id = self.client_id.as_deref().ok_or(RemoteError::MissingClientId)?;
        let encoded = STANDARD.encode(bytes);

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Client-ID {client_id}"))
            .form(&[("image", encoded.as_str()), ("type", "base64")])
            .send()?;

        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        if !status.is_success() {
            // Prefer the host's own error message when it sent one.
            return match parse_upload_response(&body) {
                Err(err @ RemoteError::UploadRejected(_)) => Err(err),
                _ => Err(RemoteError::Status {
                    url: self.endpoint.clone(),
                    status: status.as_u16(),
                }),
            };
        }

        let link = parse_upload_response(&body)?;
        log::info!("Uploaded {} bytes to {}", bytes.len(), link);
        Ok(link)
    }
}
