//! Row types for the hub's durable stores.
//!
//! Free-form JSON columns (capability lists, metadata, context payloads) are
//! stored as serialized text and exposed through typed accessors so callers
//! get the structure back verbatim.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Unique identifier for an agent
pub type AiId = String;

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Submitted, waiting for a capable agent
    Pending,
    /// Handed to an agent by the scheduler
    Assigned,
    /// Reported done by the assigned agent
    Completed,
    /// Reported failed by the assigned agent
    Failed,
}

impl TaskStatus {
    /// String form used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            "assigned" => TaskStatus::Assigned,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Pending,
        }
    }
}

/// A registered agent
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    /// Unique identifier declared by the agent itself
    pub ai_id: AiId,
    /// Display name
    pub name: String,
    /// Capability tags, stored as a JSON array
    pub capabilities: String,
    /// Free-form metadata (OS, arch, version, ...), stored as a JSON object
    pub metadata: String,
    /// When the agent first registered (Unix timestamp)
    pub registered_at: i64,
    /// Last registration or re-registration (Unix timestamp)
    pub last_seen: i64,
}

impl Agent {
    /// Build a registry row from a registration call
    pub fn new(ai_id: AiId, name: String, capabilities: &[String], metadata: Value) -> Self {
        let now = Utc::now().timestamp();
        Self {
            ai_id,
            name,
            capabilities: serde_json::to_string(capabilities).unwrap_or_else(|_| "[]".into()),
            metadata: metadata.to_string(),
            registered_at: now,
            last_seen: now,
        }
    }

    /// Capability tags as a list
    pub fn capability_list(&self) -> Vec<String> {
        serde_json::from_str(&self.capabilities).unwrap_or_default()
    }

    /// Whether this agent's capabilities cover every required tag
    pub fn has_capabilities(&self, required: &[String]) -> bool {
        let caps = self.capability_list();
        required.iter().all(|r| caps.iter().any(|c| c == r))
    }

    /// Metadata as a JSON value
    pub fn metadata_value(&self) -> Value {
        serde_json::from_str(&self.metadata).unwrap_or(Value::Null)
    }
}

/// A point-to-point message in a recipient's inbox
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Monotonic sequence number; preserves send order per recipient
    pub seq: i64,
    /// Unique identifier for the message
    pub id: String,
    /// Sender id (not required to be registered)
    pub from_ai_id: String,
    /// Recipient id (must be registered at send time)
    pub to_ai_id: AiId,
    /// Message body
    pub body: String,
    /// Free-form type tag (request, response, task_assignment, ...)
    pub message_type: String,
    /// Optional structured metadata, stored as JSON text
    pub metadata: Option<String>,
    /// Whether the recipient has marked this message read
    pub read: bool,
    /// When the message was sent (Unix timestamp)
    pub sent_at: i64,
}

impl Message {
    /// Build a new unread message (`seq` is assigned on insert)
    pub fn new(
        id: String,
        from_ai_id: String,
        to_ai_id: AiId,
        body: String,
        message_type: String,
        metadata: Option<Value>,
    ) -> Self {
        Self {
            seq: 0,
            id,
            from_ai_id,
            to_ai_id,
            body,
            message_type,
            metadata: metadata.map(|m| m.to_string()),
            read: false,
            sent_at: Utc::now().timestamp(),
        }
    }

    /// Metadata as a JSON value, if present
    pub fn metadata_value(&self) -> Option<Value> {
        self.metadata
            .as_deref()
            .and_then(|m| serde_json::from_str(m).ok())
    }
}

/// A shared context entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SharedContext {
    /// Unique key for the entry
    pub context_id: String,
    /// Arbitrary JSON payload, stored as text and returned verbatim
    pub data: String,
    /// Allow-list of reader ids as a JSON array; empty means public
    pub authorized_ai_ids: String,
    /// Seconds from creation after which the entry is invisible
    pub ttl_seconds: Option<i64>,
    /// When the entry was created or last overwritten (Unix timestamp)
    pub created_at: i64,
}

impl SharedContext {
    /// Build an entry from a `share_context` call
    pub fn new(
        context_id: String,
        data: &Value,
        authorized_ai_ids: &[String],
        ttl_seconds: Option<i64>,
    ) -> Self {
        Self {
            context_id,
            data: data.to_string(),
            authorized_ai_ids: serde_json::to_string(authorized_ai_ids)
                .unwrap_or_else(|_| "[]".into()),
            ttl_seconds,
            created_at: Utc::now().timestamp(),
        }
    }

    /// The allow-list as a list of ids
    pub fn allow_list(&self) -> Vec<String> {
        serde_json::from_str(&self.authorized_ai_ids).unwrap_or_default()
    }

    /// Whether the given reader may see this entry
    pub fn is_readable_by(&self, ai_id: &str) -> bool {
        let allowed = self.allow_list();
        allowed.is_empty() || allowed.iter().any(|a| a == ai_id)
    }

    /// Whether the entry has expired as of `now` (Unix timestamp).
    /// Entries without a TTL never expire.
    pub fn is_expired(&self, now: i64) -> bool {
        match self.ttl_seconds {
            Some(ttl) => now - self.created_at >= ttl,
            None => false,
        }
    }

    /// The stored payload as a JSON value
    pub fn data_value(&self) -> Value {
        serde_json::from_str(&self.data).unwrap_or(Value::Null)
    }
}

/// A unit of declared work
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Generated unique identifier
    pub task_id: String,
    /// What the task asks for
    pub description: String,
    /// Capability tags an agent must declare to be eligible, as a JSON array
    pub required_capabilities: String,
    /// Current lifecycle state, stored as its string form
    pub status: String,
    /// Agent the scheduler handed the task to, if any
    pub assigned_to: Option<AiId>,
    /// Result reported by the assigned agent, stored as JSON text
    pub result: Option<String>,
    /// When the task was submitted (Unix timestamp)
    pub submitted_at: i64,
}

impl Task {
    /// Build a fresh pending task
    pub fn new(task_id: String, description: String, required_capabilities: &[String]) -> Self {
        Self {
            task_id,
            description,
            required_capabilities: serde_json::to_string(required_capabilities)
                .unwrap_or_else(|_| "[]".into()),
            status: TaskStatus::Pending.as_str().to_string(),
            assigned_to: None,
            result: None,
            submitted_at: Utc::now().timestamp(),
        }
    }

    /// Required capability tags as a list
    pub fn required_list(&self) -> Vec<String> {
        serde_json::from_str(&self.required_capabilities).unwrap_or_default()
    }

    /// Lifecycle state as an enum
    pub fn status_enum(&self) -> TaskStatus {
        TaskStatus::from(self.status.as_str())
    }

    /// Reported result as a JSON value, if any
    pub fn result_value(&self) -> Option<Value> {
        self.result
            .as_deref()
            .and_then(|r| serde_json::from_str(r).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_superset() {
        let agent = Agent::new(
            "a1".to_string(),
            "Agent".to_string(),
            &["trade".to_string(), "scan".to_string()],
            json!({}),
        );
        assert!(agent.has_capabilities(&["trade".to_string()]));
        assert!(agent.has_capabilities(&["trade".to_string(), "scan".to_string()]));
        assert!(!agent.has_capabilities(&["fly".to_string()]));
        assert!(agent.has_capabilities(&[]));
    }

    #[test]
    fn test_context_allow_list() {
        let ctx = SharedContext::new("c1".to_string(), &json!({"k": 1}), &["a1".to_string()], None);
        assert!(ctx.is_readable_by("a1"));
        assert!(!ctx.is_readable_by("a2"));

        let public = SharedContext::new("c2".to_string(), &json!(null), &[], None);
        assert!(public.is_readable_by("anyone"));
    }

    #[test]
    fn test_context_expiry() {
        let ctx = SharedContext::new("c1".to_string(), &json!(1), &[], Some(60));
        assert!(!ctx.is_expired(ctx.created_at + 59));
        assert!(ctx.is_expired(ctx.created_at + 60));

        let forever = SharedContext::new("c2".to_string(), &json!(1), &[], None);
        assert!(!forever.is_expired(ctx.created_at + 1_000_000));
    }

    #[test]
    fn test_task_status_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Assigned,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from(status.as_str()), status);
        }
    }

    #[test]
    fn test_context_data_round_trip() {
        let data = json!({"nested": {"list": [1, 2, 3], "flag": true}});
        let ctx = SharedContext::new("c1".to_string(), &data, &[], None);
        assert_eq!(ctx.data_value(), data);
    }
}
