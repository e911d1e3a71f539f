//! Task creation
//!
//! Runs the full `tkn task create` pipeline against a [`TaskStore`].

use super::loader::{is_yaml_file, load_file_content};
use super::store::{Lookup, TaskStore};
use super::{decode, Task};
use crate::error::{Result, TaskError};
use reqwest::Client;
use std::fmt;
use std::path::Path;

/// Successful creation, identified by the file it came from
#[derive(Debug, Clone)]
pub struct TaskCreated {
    /// Task as returned by the store
    pub task: Task,
    /// Base name of the `--from` source
    pub source_name: String,
}

impl TaskCreated {
    /// Line printed on stdout
    pub fn confirmation(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for TaskCreated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task created: {}", self.source_name)
    }
}

/// Base name of a path or URL
pub fn source_name(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

/// Fail unless no Task with this name exists in the namespace
///
/// A definition without `metadata.name` (e.g. one relying on `generateName`)
/// cannot collide, so the lookup is skipped and the server decides.
pub async fn ensure_absent<S>(store: &S, namespace: &str, task: &Task) -> Result<()>
where
    S: TaskStore + ?Sized,
{
    let name = task.name();
    if name.is_empty() {
        tracing::debug!("Task has no name, skipping existence check");
        return Ok(());
    }

    match store
        .get(namespace, name, task.api_version.as_deref())
        .await
    {
        Ok(Lookup::NotFound) => Ok(()),
        Ok(Lookup::Found(_)) => Err(TaskError::AlreadyExists {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }),
        Err(source) => Err(TaskError::Lookup {
            name: name.to_string(),
            namespace: namespace.to_string(),
            source,
        }),
    }
}

/// Submit a Task to the store
pub async fn submit<S>(store: &S, namespace: &str, task: &Task) -> Result<Task>
where
    S: TaskStore + ?Sized,
{
    store
        .create(namespace, task)
        .await
        .map_err(|source| TaskError::Creation {
            name: task.name().to_string(),
            source,
        })
}

/// Load, decode, check and create the Task defined at `source`
pub async fn create_task<S>(
    store: &S,
    http: &Client,
    namespace: &str,
    source: &str,
) -> Result<TaskCreated>
where
    S: TaskStore + ?Sized,
{
    let content = load_file_content(http, source, is_yaml_file).await?;
    let task = decode(&content)?;

    ensure_absent(store, namespace, &task).await?;

    let created = submit(store, namespace, &task).await?;
    tracing::info!("Created task {:?} in namespace {}", created.name(), namespace);

    Ok(TaskCreated {
        task: created,
        source_name: source_name(source),
    })
}
