//! Task status polling.
//!
//! Intent APIs such as rule creation return immediately with a task UUID.
//! [`TaskClient::wait`] polls `GET tasks/{uuid}` until the task settles.
//! Polls use [`Executor::execute_quiet`], so they do not log a line each.

use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::PrismApiError;
use crate::executor::Executor;

const RESOURCE: &str = "tasks";

/// Task as returned by `GET tasks/{uuid}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub uuid: Option<String>,
    /// `QUEUED`, `RUNNING`, `SUCCEEDED`, `FAILED` or `ABORTED`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub percentage_complete: Option<u32>,
    #[serde(default)]
    pub error_detail: Option<String>,
}

impl TaskStatus {
    pub fn is_succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "FAILED" | "ABORTED")
    }
}

/// Client for the tasks API.
#[derive(Debug, Clone)]
pub struct TaskClient {
    exec: Executor,
}

impl TaskClient {
    pub(crate) fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// Fetch the current status of a task.
    pub async fn get(&self, uuid: Uuid) -> Result<TaskStatus, PrismApiError> {
        let id = uuid.to_string();
        let url = self.exec.url(&[RESOURCE, id.as_str()])?;
        let body = self.exec.execute_quiet(Method::GET, url, None).await?;
        serde_json::from_value(body).map_err(|source| PrismApiError::Deserialization {
            endpoint: format!("GET tasks/{id}"),
            source,
        })
    }

    /// Poll a task until it succeeds, fails, or `max_polls` is spent.
    ///
    /// The first poll is immediate; later polls wait `poll_interval`. A
    /// failed poll request is returned as-is, not retried.
    pub async fn wait(
        &self,
        uuid: Uuid,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<TaskStatus, PrismApiError> {
        let max_polls = max_polls.max(1);
        let mut last = String::from("UNKNOWN");

        for poll in 0..max_polls {
            if poll > 0 {
                tokio::time::sleep(poll_interval).await;
            }
            let task = self.get(uuid).await?;
            if task.is_succeeded() {
                tracing::debug!(task = %uuid, polls = poll + 1, "task succeeded");
                return Ok(task);
            }
            if task.is_failed() {
                return Err(PrismApiError::TaskFailed {
                    uuid: uuid.to_string(),
                    status: task.status,
                    detail: task.error_detail.unwrap_or_default(),
                });
            }
            last = task.status;
        }

        Err(PrismApiError::TaskTimeout {
            uuid: uuid.to_string(),
            status: last,
            polls: max_polls,
        })
    }
}
