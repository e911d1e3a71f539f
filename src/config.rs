//! Configuration Management
//!
//! Loads user defaults for tkn from the config directory.

use crate::kube::auth::validate_namespace;
use serde::Deserialize;
use std::path::PathBuf;

/// Namespace used when nothing else names one
pub const DEFAULT_NAMESPACE: &str = "default";

/// User configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Default namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Kubeconfig file to use instead of the standard lookup
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    #[serde(default)]
    pub context: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tkn").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config file: {}", e);
            Self::default()
        })
    }

    /// Get effective namespace (CLI > config > kubeconfig context > "default")
    pub fn effective_namespace(&self, flag: Option<&str>, context_namespace: Option<&str>) -> String {
        if let Some(namespace) = flag {
            return namespace.to_string();
        }

        let configured = self.namespace.as_deref().filter(|ns| {
            let valid = validate_namespace(ns);
            if !valid {
                tracing::warn!("Invalid namespace {:?} in config file", ns);
            }
            valid
        });

        configured
            .or(context_namespace)
            .unwrap_or(DEFAULT_NAMESPACE)
            .to_string()
    }
}
