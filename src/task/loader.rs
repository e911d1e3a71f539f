//! Definition loader
//!
//! Reads a definition from a local path or an `http(s)` URL and converts
//! it from YAML to JSON. Which sources are acceptable is decided by a
//! caller supplied predicate such as [`is_yaml_file`].

use crate::error::{Result, TaskError};
use crate::kube::http::USER_AGENT;
use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Accept sources ending in `.yaml` or `.yml`
pub fn is_yaml_file(target: &str) -> bool {
    target.ends_with(".yaml") || target.ends_with(".yml")
}

/// Whether a target is fetched over HTTP instead of read from disk
pub fn is_remote(target: &str) -> bool {
    target.starts_with("http")
}

/// Client used to fetch remote definitions
pub fn content_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Load a definition and return it as JSON bytes
pub async fn load_file_content<V>(http: &Client, target: &str, validate: V) -> Result<Vec<u8>>
where
    V: Fn(&str) -> bool,
{
    if !validate(target) {
        return Err(TaskError::UnsupportedFormat {
            target: target.to_string(),
        });
    }

    let content = if is_remote(target) {
        fetch_remote(http, target).await?
    } else {
        read_local(target).await?
    };

    yaml_to_json(target, &content)
}

async fn fetch_remote(http: &Client, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("Fetching remote definition {}", url);

    let retrieval = |source: reqwest::Error| TaskError::Retrieval {
        url: url.to_string(),
        source,
    };

    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(retrieval)?;
    let body = response.bytes().await.map_err(retrieval)?;

    tracing::debug!("Fetched {} bytes from {}", body.len(), url);
    Ok(body.to_vec())
}

async fn read_local(path: &str) -> Result<Vec<u8>> {
    tracing::debug!("Reading local definition {}", path);

    tokio::fs::read(path).await.map_err(|source| TaskError::Io {
        path: path.to_string(),
        source,
    })
}

/// Convert YAML (or JSON, which is valid YAML) to compact JSON
///
/// Only the first document of a multi-document stream is kept.
pub fn yaml_to_json(target: &str, content: &[u8]) -> Result<Vec<u8>> {
    let parse_error = |source: serde_yaml::Error| TaskError::Parse {
        target: target.to_string(),
        source,
    };

    let value = match serde_yaml::Deserializer::from_slice(content).next() {
        Some(document) => Value::deserialize(document).map_err(parse_error)?,
        None => Value::Null,
    };

    serde_json::to_vec(&value).map_err(|source| TaskError::Decode { source })
}
