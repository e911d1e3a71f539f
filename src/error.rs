//! Error types for the task creation pipeline
//!
//! Every stage of `tkn task create` fails with one of these variants. The
//! underlying error text (OS messages, HTTP errors, API server messages) is
//! kept verbatim in the rendered message.

use crate::kube::http::ApiError;
use thiserror::Error;

/// Failure of a single `create` invocation
#[derive(Debug, Error)]
pub enum TaskError {
    /// The source does not carry a `.yaml`/`.yml` suffix
    #[error("does not support such extension for {target}")]
    UnsupportedFormat { target: String },

    /// Reading a local file failed
    #[error("open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote definition failed
    #[error("failed to retrieve {url}: {source}")]
    Retrieval {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The content is not valid YAML
    #[error("failed to parse {target}: {source}")]
    Parse {
        target: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The normalized content does not fit the Task structure
    #[error("failed to decode task: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("provided {kind} instead of Task kind")]
    KindMismatch { kind: String },

    /// The store could not tell whether the task exists
    #[error("failed to look up task {name:?} in namespace {namespace}: {source}")]
    Lookup {
        name: String,
        namespace: String,
        #[source]
        source: ApiError,
    },

    #[error("task {name:?} already exists in namespace {namespace}")]
    AlreadyExists { name: String, namespace: String },

    #[error("failed to create task {name:?}: {source}")]
    Creation {
        name: String,
        #[source]
        source: ApiError,
    },

    /// Kubeconfig or HTTP client setup failed before the pipeline ran
    #[error("failed to create tekton client: {}", error_chain(.source.as_ref()))]
    Client {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Render an error with its causes, `outer: inner: root`
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(next) = cause {
        rendered.push_str(": ");
        rendered.push_str(&next.to_string());
        cause = next.source();
    }
    rendered
}
