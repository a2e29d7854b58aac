use async_trait::async_trait;
use tracing::info;

use super::{TaskRequest, TaskSink};
use crate::error::EngineError;

/// Default task collaborator: records the request in the log stream.
///
/// Deployments with a real task system supply their own `TaskSink`.
#[derive(Debug, Default)]
pub struct LoggingTaskSink;

impl LoggingTaskSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskSink for LoggingTaskSink {
    async fn create_task(&self, task: TaskRequest) -> Result<(), EngineError> {
        info!(
            title = %task.title,
            related_to = %task.related_to,
            "task created"
        );
        Ok(())
    }
}
