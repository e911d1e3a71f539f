//! HTTP utilities for Kubernetes API server calls

use anyhow::Context;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

pub const USER_AGENT: &str = concat!("tkn/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Error returned by the API server or the transport underneath it
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered, but not with the object that was asked for
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Whether a 404 body is a Kubernetes `Status` for a missing object
///
/// Unserved group/versions also answer 404, with a plain-text body.
fn is_object_not_found(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .map(|v| {
            v.get("kind").and_then(|k| k.as_str()) == Some("Status")
                && v.get("reason").and_then(|r| r.as_str()) == Some("NotFound")
        })
        .unwrap_or(false)
}

/// Extract the human readable message from a Kubernetes `Status` body
fn status_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| status.to_string())
}

/// TLS settings taken from the kubeconfig cluster entry
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// PEM encoded CA bundle
    pub ca_pem: Option<Vec<u8>>,
    pub insecure_skip_verify: bool,
}

/// HTTP client wrapper for Kubernetes API calls
#[derive(Clone)]
pub struct KubeHttpClient {
    client: Client,
}

impl KubeHttpClient {
    /// Create a new HTTP client
    pub fn new(tls: &TlsOptions) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if let Some(pem) = &tls.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .context("Failed to parse cluster certificate authority")?;
            builder = builder.add_root_certificate(cert);
        }
        if tls.insecure_skip_verify {
            tracing::warn!("TLS verification disabled for the API server");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// GET a single object; `Ok(None)` when the object does not exist
    pub async fn get(&self, url: &str, token: Option<&str>) -> Result<Option<Value>, ApiError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            let body = response.text().await?;
            if is_object_not_found(&body) {
                tracing::debug!("GET {} -> 404 NotFound", url);
                return Ok(None);
            }
            tracing::error!("API error: 404 - {}", sanitize_for_log(&body));
            return Err(ApiError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: status_message(StatusCode::NOT_FOUND, &body),
            });
        }

        read_json(response).await.map(Some)
    }

    /// POST a JSON body
    pub async fn post(&self, url: &str, token: Option<&str>, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: status_message(status, &body),
        });
    }

    // Handle empty response
    if body.is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&body)?)
}
