//! Tekton Task resources
//!
//! This module implements `tkn task create`: a single-pass pipeline that
//! turns a YAML definition into a Task stored on the cluster.
//!
//! # Architecture
//!
//! - [`loader`] - Reads a local file or remote URL and normalizes YAML to JSON
//! - [`decoder`] - Decodes JSON into a [`Task`] and checks its kind
//! - [`store`] - The [`TaskStore`] seam and its Kubernetes implementation
//! - [`create`] - Existence check, creation and the confirmation line
//!
//! ```text
//! load ──► decode ──► ensure_absent ──► create ──► "Task created: <file>"
//! ```
//!
//! Each stage short-circuits with a [`TaskError`](crate::error::TaskError);
//! nothing is retried.

pub mod create;
pub mod decoder;
pub mod loader;
pub mod store;

pub use create::{create_task, ensure_absent, submit, TaskCreated};
pub use decoder::decode;
pub use loader::{is_yaml_file, load_file_content};
pub use store::{Lookup, TaskStore};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The `kind` every definition given to `tkn task create` must declare
pub const TASK_KIND: &str = "Task";

/// Plural resource name used in API paths
pub const TASK_RESOURCE: &str = "tasks";

/// Standard object metadata (only `name` is required by this client)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Empty when the server is left to pick one from `generateName`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Remaining metadata, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A Tekton Task definition
///
/// `spec` is kept opaque; the API server validates it on creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub spec: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
