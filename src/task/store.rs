//! Task store
//!
//! The cluster is the system of record for Tasks. [`TaskStore`] is the seam
//! the create pipeline talks to; [`KubeClient`] implements it over the
//! Tekton REST API.

use super::{Task, TASK_KIND, TASK_RESOURCE};
use crate::kube::client::{tekton_version, KubeClient};
use crate::kube::http::ApiError;
use async_trait::async_trait;

/// Outcome of looking a Task up by name
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Task),
    NotFound,
}

/// Namespaced Task storage
#[async_trait]
pub trait TaskStore {
    /// Get a Task by name, under the API version the definition declares
    async fn get(
        &self,
        namespace: &str,
        name: &str,
        api_version: Option<&str>,
    ) -> Result<Lookup, ApiError>;

    /// Create a Task, returning the stored object
    async fn create(&self, namespace: &str, task: &Task) -> Result<Task, ApiError>;
}

#[async_trait]
impl TaskStore for KubeClient {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
        api_version: Option<&str>,
    ) -> Result<Lookup, ApiError> {
        let version = tekton_version(api_version);
        let url = self.tekton_object_url(version, namespace, TASK_RESOURCE, name);

        let Some(value) = KubeClient::get(self, &url).await? else {
            return Ok(Lookup::NotFound);
        };

        let task: Task = serde_json::from_value(value)?;
        if task.kind != TASK_KIND || task.name() != name {
            return Err(ApiError::Unexpected(format!(
                "GET {} returned kind {:?} named {:?}",
                url,
                task.kind,
                task.name()
            )));
        }
        Ok(Lookup::Found(task))
    }

    async fn create(&self, namespace: &str, task: &Task) -> Result<Task, ApiError> {
        let version = tekton_version(task.api_version.as_deref());
        let url = self.tekton_collection_url(version, namespace, TASK_RESOURCE);
        let body = serde_json::to_value(task)?;

        let created = self.post(&url, &body).await?;
        if created.is_null() {
            return Ok(task.clone());
        }
        Ok(serde_json::from_value(created)?)
    }
}
