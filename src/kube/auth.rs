//! Kubeconfig handling
//!
//! Locates and parses the kubeconfig file, then resolves the selected
//! context into the server URL, bearer token, TLS settings and default
//! namespace used to reach the API server.

use super::http::TlsOptions;
use anyhow::{anyhow, Context, Result};
use base64::Engine;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Kubeconfig file contents (only the fields this client understands)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub current_context: Option<String>,
    /// Directory relative file references are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    pub server: String,
    #[serde(default)]
    pub certificate_authority: Option<String>,
    #[serde(default)]
    pub certificate_authority_data: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: KubeContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KubeContext {
    pub cluster: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    pub token_file: Option<String>,
}

/// Everything needed to talk to one API server
#[derive(Debug, Clone, Default)]
pub struct ClusterCredentials {
    pub server: String,
    pub token: Option<String>,
    pub tls: TlsOptions,
    pub namespace: Option<String>,
}

/// Find the kubeconfig file: explicit path > $KUBECONFIG > ~/.kube/config
pub fn kubeconfig_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(value) = std::env::var("KUBECONFIG") {
        // Only the first entry of a merged list is used
        if let Some(first) = std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty()) {
            return Some(first);
        }
    }

    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}

/// Validate a namespace name (RFC 1123 label)
/// At most 63 characters, lowercase alphanumerics and hyphens, alphanumeric at both ends
pub fn validate_namespace(namespace: &str) -> bool {
    if namespace.is_empty() || namespace.len() > 63 {
        return false;
    }
    if namespace.starts_with('-') || namespace.ends_with('-') {
        return false;
    }
    namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl KubeConfig {
    /// Load a kubeconfig from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse kubeconfig {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve a context (or the current one) into connection settings
    pub fn resolve(&self, context: Option<&str>) -> Result<ClusterCredentials> {
        let context_name = context
            .or(self.current_context.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("no current context is set in kubeconfig"))?;

        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .map(|c| &c.context)
            .ok_or_else(|| anyhow!("context {:?} not found in kubeconfig", context_name))?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| anyhow!("cluster {:?} not found in kubeconfig", context.cluster))?;

        let user = context
            .user
            .as_deref()
            .and_then(|name| self.users.iter().find(|u| u.name == name))
            .map(|u| &u.user);

        let token = match user {
            Some(User { token: Some(token), .. }) => Some(token.trim().to_string()),
            Some(User { token_file: Some(file), .. }) => {
                let path = self.resolve_path(file);
                let token = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read token file {}", path.display()))?;
                Some(token.trim().to_string())
            }
            _ => None,
        };

        let ca_pem = if let Some(data) = &cluster.certificate_authority_data {
            let pem = base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .context("Invalid certificate-authority-data")?;
            Some(pem)
        } else if let Some(file) = &cluster.certificate_authority {
            let path = self.resolve_path(file);
            let pem = std::fs::read(&path)
                .with_context(|| format!("Failed to read certificate authority {}", path.display()))?;
            Some(pem)
        } else {
            None
        };

        let namespace = context.namespace.clone().filter(|ns| {
            let valid = validate_namespace(ns);
            if !valid {
                tracing::warn!("Invalid namespace {:?} in kubeconfig context", ns);
            }
            valid
        });

        Ok(ClusterCredentials {
            server: cluster.server.trim_end_matches('/').to_string(),
            token,
            tls: TlsOptions {
                ca_pem,
                insecure_skip_verify: cluster.insecure_skip_tls_verify,
            },
            namespace,
        })
    }

    fn resolve_path(&self, file: &str) -> PathBuf {
        let path = PathBuf::from(file);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}
