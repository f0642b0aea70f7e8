//! Shared context operations
//!
//! Keyed JSON blobs with allow-list access control and optional TTL.
//! `share_context` is last-writer-wins per key and replaces the allow-list
//! wholesale. Expiry is checked lazily at read time; there is no sweeper.

use crate::error::HubError;
use crate::hub::{require_non_empty, Hub};
use crate::store::SharedContext;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Result of a `share_context` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareReceipt {
    /// Key the entry was stored under
    pub context_id: String,
    /// Readers allowed at this write; empty means public
    pub authorized_ai_ids: Vec<String>,
}

impl Hub {
    /// Create or overwrite the entry under `context_id`. An empty or omitted
    /// allow-list makes the entry readable by any caller; `ttl` (seconds)
    /// makes it expire relative to this write.
    pub async fn share_context(
        &self,
        context_id: &str,
        data: Value,
        authorized_ai_ids: Option<Vec<String>>,
        ttl: Option<i64>,
    ) -> Result<ShareReceipt, HubError> {
        require_non_empty(context_id, "contextId")?;
        if let Some(ttl) = ttl {
            if ttl < 0 {
                return Err(HubError::Validation("ttl must not be negative".to_string()));
            }
        }

        let allow_list = authorized_ai_ids.unwrap_or_default();
        let entry = SharedContext::new(context_id.to_string(), &data, &allow_list, ttl);
        self.db().upsert_context(&entry).await?;

        debug!(context_id = %context_id, readers = allow_list.len(), "Context stored");
        Ok(ShareReceipt {
            context_id: context_id.to_string(),
            authorized_ai_ids: allow_list,
        })
    }

    /// Read the entry under `context_id` as `ai_id`. Absent and expired
    /// entries are indistinguishable (`ContextNotFound`); a non-empty
    /// allow-list without the reader yields `AccessDenied`. On success the
    /// stored data comes back structurally equal to what was written.
    pub async fn get_shared_context(
        &self,
        context_id: &str,
        ai_id: &str,
    ) -> Result<Value, HubError> {
        require_non_empty(context_id, "contextId")?;
        require_non_empty(ai_id, "aiId")?;

        let entry = self
            .db()
            .get_context(context_id)
            .await?
            .ok_or_else(|| HubError::ContextNotFound(context_id.to_string()))?;

        if entry.is_expired(Utc::now().timestamp()) {
            return Err(HubError::ContextNotFound(context_id.to_string()));
        }

        if !entry.is_readable_by(ai_id) {
            return Err(HubError::AccessDenied {
                context_id: context_id.to_string(),
                ai_id: ai_id.to_string(),
            });
        }

        Ok(entry.data_value())
    }
}
