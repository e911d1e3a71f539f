//! Kubernetes Client
//!
//! Main client for the Tekton API, combining kubeconfig credentials
//! and HTTP functionality.

use super::auth::{ClusterCredentials, KubeConfig};
use super::http::{ApiError, KubeHttpClient};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// API group Tekton resources are served under
pub const TEKTON_GROUP: &str = "tekton.dev";

/// Version used when a definition does not name one
pub const DEFAULT_TEKTON_VERSION: &str = "v1alpha1";

/// Main Kubernetes client
#[derive(Clone)]
pub struct KubeClient {
    pub http: KubeHttpClient,
    pub server: String,
    token: Option<String>,
    /// Namespace of the selected kubeconfig context, if any
    pub context_namespace: Option<String>,
}

impl KubeClient {
    /// Create a client from a kubeconfig file
    pub fn from_kubeconfig(path: &Path, context: Option<&str>) -> Result<Self> {
        let config = KubeConfig::load(path)?;
        let credentials = config
            .resolve(context)
            .context("Failed to resolve kubeconfig context")?;
        Self::new(credentials)
    }

    /// Create a client from already resolved credentials
    pub fn new(credentials: ClusterCredentials) -> Result<Self> {
        let http = KubeHttpClient::new(&credentials.tls)?;

        tracing::debug!("Using API server {}", credentials.server);

        Ok(Self {
            http,
            server: credentials.server,
            token: credentials.token,
            context_namespace: credentials.namespace,
        })
    }

    /// Make a GET request; `Ok(None)` when the object does not exist
    pub async fn get(&self, url: &str) -> Result<Option<Value>, ApiError> {
        self.http.get(url, self.token.as_deref()).await
    }

    /// Make a POST request to the API server
    pub async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        self.http.post(url, self.token.as_deref(), body).await
    }

    // =========================================================================
    // Tekton API helpers
    // =========================================================================

    /// Build a namespaced Tekton collection URL
    pub fn tekton_collection_url(&self, version: &str, namespace: &str, resource: &str) -> String {
        format!(
            "{}/apis/{}/{}/namespaces/{}/{}",
            self.server,
            TEKTON_GROUP,
            version,
            urlencoding::encode(namespace),
            resource
        )
    }

    /// Build a namespaced Tekton object URL
    pub fn tekton_object_url(
        &self,
        version: &str,
        namespace: &str,
        resource: &str,
        name: &str,
    ) -> String {
        format!(
            "{}/{}",
            self.tekton_collection_url(version, namespace, resource),
            urlencoding::encode(name)
        )
    }
}

/// Pick the Tekton API version from an `apiVersion` field
pub fn tekton_version(api_version: Option<&str>) -> &str {
    api_version
        .and_then(|v| v.strip_prefix(TEKTON_GROUP))
        .and_then(|v| v.strip_prefix('/'))
        .filter(|v| !v.is_empty() && !v.contains('/'))
        .unwrap_or(DEFAULT_TEKTON_VERSION)
}
