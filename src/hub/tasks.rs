//! Task queue operations and the assignment pass
//!
//! Per-task state machine: `pending -> assigned -> completed | failed`, no
//! skipped states. The assignment pass performs the only `pending ->
//! assigned` transition; a completion report from the assigned agent performs
//! the terminal one. Tasks are never deleted.

use crate::error::HubError;
use crate::hub::{require_non_empty, Hub, SYSTEM_SENDER, TASK_ASSIGNMENT_TYPE};
use crate::store::{Message, Task, TaskStatus};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// Result of a `submit_task` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    /// Generated id of the queued task
    pub task_id: String,
    /// Initial lifecycle state (always `pending`)
    pub status: TaskStatus,
}

/// One task as returned by `list_tasks`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDoc {
    /// Task id
    pub task_id: String,
    /// What the task asks for
    pub description: String,
    /// Capability tags an eligible agent must declare
    pub required_capabilities: Vec<String>,
    /// Current lifecycle state
    pub status: TaskStatus,
    /// Agent the task was assigned to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Reported result, if the task reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Submission time (Unix timestamp)
    pub submitted_at: i64,
}

impl From<&Task> for TaskDoc {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.task_id.clone(),
            description: task.description.clone(),
            required_capabilities: task.required_list(),
            status: task.status_enum(),
            assigned_to: task.assigned_to.clone(),
            result: task.result_value(),
            submitted_at: task.submitted_at,
        }
    }
}

/// Result of `list_tasks`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    /// All tasks in submission order
    pub tasks: Vec<TaskDoc>,
}

/// Result of a `complete_task` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReceipt {
    /// The terminated task
    pub task_id: String,
    /// Terminal state the task reached
    pub status: TaskStatus,
}

impl Hub {
    /// Queue a task in `pending` state and return its id immediately.
    /// Assignment happens asynchronously on the next scheduler pass.
    pub async fn submit_task(
        &self,
        description: &str,
        required_capabilities: Vec<String>,
    ) -> Result<SubmitReceipt, HubError> {
        require_non_empty(description, "description")?;

        let task = Task::new(
            Uuid::new_v4().to_string(),
            description.to_string(),
            &required_capabilities,
        );
        self.db().insert_task(&task).await?;

        info!(task_id = %task.task_id, required = ?required_capabilities, "Task submitted");
        Ok(SubmitReceipt {
            task_id: task.task_id,
            status: TaskStatus::Pending,
        })
    }

    /// All tasks with their current status, for polling by submitters
    pub async fn list_tasks(&self) -> Result<TaskListing, HubError> {
        let tasks = self.db().list_tasks().await?;
        Ok(TaskListing {
            tasks: tasks.iter().map(TaskDoc::from).collect(),
        })
    }

    /// Record a completion report from the assigned agent, transitioning the
    /// task to `completed` (or `failed` when `success` is false).
    pub async fn complete_task(
        &self,
        task_id: &str,
        ai_id: &str,
        result: Value,
        success: bool,
    ) -> Result<CompletionReceipt, HubError> {
        require_non_empty(task_id, "taskId")?;
        require_non_empty(ai_id, "aiId")?;

        let task = self
            .db()
            .get_task(task_id)
            .await?
            .ok_or_else(|| HubError::TaskNotFound(task_id.to_string()))?;

        match task.status_enum() {
            TaskStatus::Assigned => {}
            TaskStatus::Pending => {
                return Err(HubError::Validation(format!(
                    "task {} has not been assigned yet",
                    task_id
                )))
            }
            TaskStatus::Completed | TaskStatus::Failed => {
                return Err(HubError::Validation(format!(
                    "task {} already reached a terminal state",
                    task_id
                )))
            }
        }

        if task.assigned_to.as_deref() != Some(ai_id) {
            return Err(HubError::Validation(format!(
                "task {} is not assigned to {}",
                task_id, ai_id
            )));
        }

        let status = if success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };

        // The guarded update re-checks state and reporter, so a racing report
        // loses cleanly instead of overwriting the first one.
        let transitioned = self
            .db()
            .finish_task(task_id, ai_id, status, &result.to_string())
            .await?;
        if !transitioned {
            return Err(HubError::Validation(format!(
                "task {} already reached a terminal state",
                task_id
            )));
        }

        info!(task_id = %task_id, status = status.as_str(), "Task finished");
        Ok(CompletionReceipt {
            task_id: task_id.to_string(),
            status,
        })
    }

    /// One assignment pass: for each pending task in submission order, find
    /// the first registered agent (registration order) whose capabilities
    /// cover the task's requirements, commit the transition, and notify the
    /// agent with a system message. Returns how many tasks were assigned.
    ///
    /// Tasks with no eligible agent stay pending and are retried on the next
    /// pass; that is accepted, not an error.
    pub async fn assign_pending_tasks(&self) -> Result<usize, HubError> {
        let pending = self.db().list_pending_tasks().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let agents = self.db().list_agents().await?;
        let mut assigned = 0;

        for task in &pending {
            let required = task.required_list();
            let Some(agent) = agents.iter().find(|a| a.has_capabilities(&required)) else {
                continue;
            };

            let notification = Message::new(
                Uuid::new_v4().to_string(),
                SYSTEM_SENDER.to_string(),
                agent.ai_id.clone(),
                format!("New task assigned: {}", task.description),
                TASK_ASSIGNMENT_TYPE.to_string(),
                Some(json!({
                    "type": TASK_ASSIGNMENT_TYPE,
                    "taskId": task.task_id,
                })),
            );

            if self
                .db()
                .assign_task(&task.task_id, &agent.ai_id, &notification)
                .await?
            {
                info!(task_id = %task.task_id, ai_id = %agent.ai_id, "Task assigned");
                assigned += 1;
            }
        }

        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_hub() -> Hub {
        Hub::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_submit_returns_pending_id() {
        let hub = test_hub().await;
        let receipt = hub
            .submit_task("scan the pools", vec!["scan".to_string()])
            .await
            .unwrap();
        assert_eq!(receipt.status, TaskStatus::Pending);

        let listing = hub.list_tasks().await.unwrap();
        assert_eq!(listing.tasks.len(), 1);
        assert_eq!(listing.tasks[0].task_id, receipt.task_id);
        assert_eq!(listing.tasks[0].status, TaskStatus::Pending);
        assert!(listing.tasks[0].assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_pass_assigns_to_capable_agent_and_notifies() {
        let hub = test_hub().await;
        hub.register_ai("clerk", "Clerk", vec!["filing".to_string()], None)
            .await
            .unwrap();
        hub.register_ai(
            "executor",
            "Executor",
            vec!["flash-loan".to_string(), "arbitrage-execution".to_string()],
            None,
        )
        .await
        .unwrap();

        let receipt = hub
            .submit_task(
                "execute arbitrage",
                vec!["arbitrage-execution".to_string(), "flash-loan".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(hub.assign_pending_tasks().await.unwrap(), 1);

        let listing = hub.list_tasks().await.unwrap();
        assert_eq!(listing.tasks[0].status, TaskStatus::Assigned);
        assert_eq!(listing.tasks[0].assigned_to.as_deref(), Some("executor"));

        // The incapable agent got nothing
        let clerk_inbox = hub.read_messages("clerk", true, false).await.unwrap();
        assert_eq!(clerk_inbox.message_count, 0);

        let inbox = hub.read_messages("executor", true, false).await.unwrap();
        assert_eq!(inbox.message_count, 1);
        let notice = &inbox.messages[0];
        assert_eq!(notice.from, SYSTEM_SENDER);
        assert_eq!(notice.message_type, TASK_ASSIGNMENT_TYPE);
        assert_eq!(
            notice.metadata,
            Some(json!({"type": "task_assignment", "taskId": receipt.task_id}))
        );
    }

    #[tokio::test]
    async fn test_unsatisfiable_task_stays_pending() {
        let hub = test_hub().await;
        hub.register_ai("worker", "Worker", vec!["scan".to_string()], None)
            .await
            .unwrap();
        hub.submit_task("impossible", vec!["teleportation".to_string()])
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(hub.assign_pending_tasks().await.unwrap(), 0);
        }

        let listing = hub.list_tasks().await.unwrap();
        assert_eq!(listing.tasks[0].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_two_tasks_one_agent_distinct_assignments() {
        let hub = test_hub().await;
        hub.register_ai("solo", "Solo", vec!["exec".to_string()], None)
            .await
            .unwrap();

        let first = hub
            .submit_task("task one", vec!["exec".to_string()])
            .await
            .unwrap();
        let second = hub
            .submit_task("task two", vec!["exec".to_string()])
            .await
            .unwrap();
        assert_ne!(first.task_id, second.task_id);

        assert_eq!(hub.assign_pending_tasks().await.unwrap(), 2);
        // Re-running the pass never re-assigns
        assert_eq!(hub.assign_pending_tasks().await.unwrap(), 0);

        let listing = hub.list_tasks().await.unwrap();
        assert!(listing
            .tasks
            .iter()
            .all(|t| t.status == TaskStatus::Assigned
                && t.assigned_to.as_deref() == Some("solo")));

        // Exactly one notice per task
        let inbox = hub.read_messages("solo", false, false).await.unwrap();
        assert_eq!(inbox.message_count, 2);
    }

    #[tokio::test]
    async fn test_tie_break_is_registration_order() {
        let hub = test_hub().await;
        hub.register_ai("early", "Early", vec!["exec".to_string()], None)
            .await
            .unwrap();
        hub.register_ai("late", "Late", vec!["exec".to_string()], None)
            .await
            .unwrap();

        hub.submit_task("work", vec!["exec".to_string()])
            .await
            .unwrap();
        hub.assign_pending_tasks().await.unwrap();

        let listing = hub.list_tasks().await.unwrap();
        assert_eq!(listing.tasks[0].assigned_to.as_deref(), Some("early"));
    }

    #[tokio::test]
    async fn test_completion_path() {
        let hub = test_hub().await;
        hub.register_ai("worker", "Worker", vec!["exec".to_string()], None)
            .await
            .unwrap();
        let receipt = hub
            .submit_task("work", vec!["exec".to_string()])
            .await
            .unwrap();

        // Terminal transition cannot skip the assigned state
        let err = hub
            .complete_task(&receipt.task_id, "worker", json!("done"), true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        hub.assign_pending_tasks().await.unwrap();

        // Only the assigned agent may report
        let err = hub
            .complete_task(&receipt.task_id, "impostor", json!("done"), true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let done = hub
            .complete_task(&receipt.task_id, "worker", json!({"profit": 42}), true)
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        // A second report is rejected
        let err = hub
            .complete_task(&receipt.task_id, "worker", json!("again"), true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ValidationError");

        let listing = hub.list_tasks().await.unwrap();
        assert_eq!(listing.tasks[0].result, Some(json!({"profit": 42})));
    }

    #[tokio::test]
    async fn test_failed_report() {
        let hub = test_hub().await;
        hub.register_ai("worker", "Worker", vec![], None).await.unwrap();
        let receipt = hub.submit_task("work", vec![]).await.unwrap();
        hub.assign_pending_tasks().await.unwrap();

        let done = hub
            .complete_task(&receipt.task_id, "worker", json!("boom"), false)
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Failed);

        let err = hub
            .complete_task("no-such-task", "worker", json!(null), true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TaskNotFound");
    }
}
