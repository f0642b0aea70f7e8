//! Database operations for the hub's durable stores.
//!
//! Every mutating operation commits before it returns, so state introduced in
//! one process lifetime is visible to a freshly started process pointed at the
//! same database file.

use crate::error::HubError;
use crate::store::models::{Agent, Message, SharedContext, Task, TaskStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Database connection pool for the hub stores
pub struct HubDb {
    pool: SqlitePool,
}

impl HubDb {
    /// Open (creating if missing) the database at `db_path` and apply the
    /// schema migrations.
    pub async fn new(db_path: &str) -> Result<Self, HubError> {
        // Ensure parent directory exists
        if let Some(parent) = PathBuf::from(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HubError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
                })?;
            }
        }

        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| HubError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        // A single connection keeps every writer serialized (SQLite allows
        // only one anyway) and keeps in-memory databases coherent across
        // the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Apply the schema migration file statement by statement
    async fn run_migrations(&self) -> Result<(), HubError> {
        let migration_sql = include_str!("../../migrations/001_create_hub.sql");

        // Strip comment lines, then split on semicolons
        let cleaned: String = migration_sql
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("--"))
            .collect::<Vec<_>>()
            .join(" ");

        for statement in cleaned.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("Database migrations applied");
        Ok(())
    }

    // --- Agent registry ---

    /// Upsert an agent record. A new id inserts the full row; a known id
    /// updates name, capabilities and metadata and refreshes `last_seen`
    /// while keeping the original `registered_at`.
    pub async fn upsert_agent(&self, agent: &Agent) -> Result<(), HubError> {
        sqlx::query(
            "INSERT INTO agents (ai_id, name, capabilities, metadata, registered_at, last_seen) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(ai_id) DO UPDATE SET \
               name = excluded.name, \
               capabilities = excluded.capabilities, \
               metadata = excluded.metadata, \
               last_seen = excluded.last_seen",
        )
        .bind(&agent.ai_id)
        .bind(&agent.name)
        .bind(&agent.capabilities)
        .bind(&agent.metadata)
        .bind(agent.registered_at)
        .bind(agent.last_seen)
        .execute(&self.pool)
        .await?;

        debug!("Registered agent: {}", agent.ai_id);
        Ok(())
    }

    /// Fetch a single agent by id
    pub async fn get_agent(&self, ai_id: &str) -> Result<Option<Agent>, HubError> {
        let agent = sqlx::query_as::<_, Agent>(
            "SELECT ai_id, name, capabilities, metadata, registered_at, last_seen \
             FROM agents WHERE ai_id = ?",
        )
        .bind(ai_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agent)
    }

    /// All agents in registration order
    pub async fn list_agents(&self) -> Result<Vec<Agent>, HubError> {
        let agents = sqlx::query_as::<_, Agent>(
            "SELECT ai_id, name, capabilities, metadata, registered_at, last_seen \
             FROM agents ORDER BY registered_at ASC, ai_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(agents)
    }

    /// Number of registered agents
    pub async fn count_agents(&self) -> Result<i64, HubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    // --- Message store ---

    /// Append a message to the recipient's inbox. The foreign key on
    /// `to_ai_id` backs the registered-recipient invariant.
    pub async fn insert_message(&self, message: &Message) -> Result<(), HubError> {
        sqlx::query(
            "INSERT INTO messages (id, from_ai_id, to_ai_id, body, message_type, metadata, read, sent_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.from_ai_id)
        .bind(&message.to_ai_id)
        .bind(&message.body)
        .bind(&message.message_type)
        .bind(&message.metadata)
        .bind(message.read)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored message {} for {}", message.id, message.to_ai_id);
        Ok(())
    }

    /// A recipient's messages in send order, optionally unread only
    pub async fn messages_for(
        &self,
        ai_id: &str,
        unread_only: bool,
    ) -> Result<Vec<Message>, HubError> {
        let sql = if unread_only {
            "SELECT seq, id, from_ai_id, to_ai_id, body, message_type, metadata, read, sent_at \
             FROM messages WHERE to_ai_id = ? AND read = 0 ORDER BY seq ASC"
        } else {
            "SELECT seq, id, from_ai_id, to_ai_id, body, message_type, metadata, read, sent_at \
             FROM messages WHERE to_ai_id = ? ORDER BY seq ASC"
        };

        let messages = sqlx::query_as::<_, Message>(sql)
            .bind(ai_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    /// Flip a recipient's messages to read, up to and including `up_to_seq`.
    /// Bounded by sequence so a message arriving mid-call is not consumed
    /// before anyone saw it.
    pub async fn mark_read(&self, ai_id: &str, up_to_seq: i64) -> Result<(), HubError> {
        sqlx::query("UPDATE messages SET read = 1 WHERE to_ai_id = ? AND seq <= ?")
            .bind(ai_id)
            .bind(up_to_seq)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // --- Shared context store ---

    /// Create or overwrite a context entry (last-writer-wins; the allow-list
    /// is replaced wholesale)
    pub async fn upsert_context(&self, context: &SharedContext) -> Result<(), HubError> {
        sqlx::query(
            "INSERT OR REPLACE INTO contexts \
             (context_id, data, authorized_ai_ids, ttl_seconds, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&context.context_id)
        .bind(&context.data)
        .bind(&context.authorized_ai_ids)
        .bind(context.ttl_seconds)
        .bind(context.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored context: {}", context.context_id);
        Ok(())
    }

    /// Fetch a context entry by id. Expiry is the caller's concern.
    pub async fn get_context(&self, context_id: &str) -> Result<Option<SharedContext>, HubError> {
        let context = sqlx::query_as::<_, SharedContext>(
            "SELECT context_id, data, authorized_ai_ids, ttl_seconds, created_at \
             FROM contexts WHERE context_id = ?",
        )
        .bind(context_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(context)
    }

    // --- Task queue ---

    /// Insert a freshly submitted pending task
    pub async fn insert_task(&self, task: &Task) -> Result<(), HubError> {
        sqlx::query(
            "INSERT INTO tasks \
             (task_id, description, required_capabilities, status, assigned_to, result, submitted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.task_id)
        .bind(&task.description)
        .bind(&task.required_capabilities)
        .bind(&task.status)
        .bind(&task.assigned_to)
        .bind(&task.result)
        .bind(task.submitted_at)
        .execute(&self.pool)
        .await?;

        debug!("Queued task: {}", task.task_id);
        Ok(())
    }

    /// Fetch a single task by id
    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>, HubError> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT task_id, description, required_capabilities, status, assigned_to, result, submitted_at \
             FROM tasks WHERE task_id = ?",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// All tasks in submission order
    pub async fn list_tasks(&self) -> Result<Vec<Task>, HubError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT task_id, description, required_capabilities, status, assigned_to, result, submitted_at \
             FROM tasks ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Pending tasks in submission order
    pub async fn list_pending_tasks(&self) -> Result<Vec<Task>, HubError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT task_id, description, required_capabilities, status, assigned_to, result, submitted_at \
             FROM tasks WHERE status = 'pending' ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    /// Commit a `pending -> assigned` transition and enqueue the notification
    /// message in the same transaction. Returns `false` without side effects
    /// if the task was no longer pending, so a repeated or racing pass can
    /// never double-assign.
    pub async fn assign_task(
        &self,
        task_id: &str,
        ai_id: &str,
        notification: &Message,
    ) -> Result<bool, HubError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE tasks SET status = ?, assigned_to = ? WHERE task_id = ? AND status = ?",
        )
        .bind(TaskStatus::Assigned.as_str())
        .bind(ai_id)
        .bind(task_id)
        .bind(TaskStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO messages (id, from_ai_id, to_ai_id, body, message_type, metadata, read, sent_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.from_ai_id)
        .bind(&notification.to_ai_id)
        .bind(&notification.body)
        .bind(&notification.message_type)
        .bind(&notification.metadata)
        .bind(notification.read)
        .bind(notification.sent_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Assigned task {} to {}", task_id, ai_id);
        Ok(true)
    }

    /// Commit an `assigned -> completed|failed` transition, recording the
    /// result. Guarded on both current status and reporter, so only the
    /// assigned agent can terminate the task and only once.
    pub async fn finish_task(
        &self,
        task_id: &str,
        ai_id: &str,
        status: TaskStatus,
        result: &str,
    ) -> Result<bool, HubError> {
        let updated = sqlx::query(
            "UPDATE tasks SET status = ?, result = ? \
             WHERE task_id = ? AND status = ? AND assigned_to = ?",
        )
        .bind(status.as_str())
        .bind(result)
        .bind(task_id)
        .bind(TaskStatus::Assigned.as_str())
        .bind(ai_id)
        .execute(&self.pool)
        .await?;

        Ok(updated.rows_affected() == 1)
    }

    /// The underlying pool (for advanced operations if needed)
    #[allow(dead_code)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
