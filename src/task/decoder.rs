//! Task decoding

use super::{Task, TASK_KIND};
use crate::error::{Result, TaskError};

/// Decode normalized JSON into a Task, rejecting any other kind
pub fn decode(content: &[u8]) -> Result<Task> {
    let task: Task =
        serde_json::from_slice(content).map_err(|source| TaskError::Decode { source })?;

    if task.kind != TASK_KIND {
        return Err(TaskError::KindMismatch { kind: task.kind });
    }

    tracing::debug!("Decoded task {:?}", task.name());
    Ok(task)
}
