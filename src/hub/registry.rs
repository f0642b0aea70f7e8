//! Agent registry operations
//!
//! `register_ai` is an idempotent upsert: the first call for an id creates
//! the record, later calls update name/capabilities/metadata and refresh
//! `lastSeen`. There is no deregistration; liveness is advisory only.

use crate::error::HubError;
use crate::hub::{require_non_empty, Hub};
use crate::store::{Agent, AiId};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Result of a `register_ai` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReceipt {
    /// The registered id
    pub ai_id: AiId,
    /// Number of unique agents known after this call
    pub total_agents: i64,
}

/// One agent in the directory listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    /// Unique agent id
    pub ai_id: AiId,
    /// Display name
    pub name: String,
    /// Declared capability tags
    pub capabilities: Vec<String>,
    /// Free-form metadata as declared at registration
    pub metadata: Value,
    /// First registration (Unix timestamp)
    pub registered_at: i64,
    /// Most recent registration (Unix timestamp)
    pub last_seen: i64,
}

impl From<&Agent> for AgentInfo {
    fn from(agent: &Agent) -> Self {
        Self {
            ai_id: agent.ai_id.clone(),
            name: agent.name.clone(),
            capabilities: agent.capability_list(),
            metadata: agent.metadata_value(),
            registered_at: agent.registered_at,
            last_seen: agent.last_seen,
        }
    }
}

/// Result of `list_connected_ais`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDirectory {
    /// Count of unique registered ids
    #[serde(rename = "totalAIs")]
    pub total_ais: usize,
    /// All known agents in registration order
    pub ais: Vec<AgentInfo>,
}

impl Hub {
    /// Upsert an agent record. Never duplicates an id; always succeeds for
    /// well-formed arguments.
    pub async fn register_ai(
        &self,
        ai_id: &str,
        name: &str,
        capabilities: Vec<String>,
        metadata: Option<Value>,
    ) -> Result<RegisterReceipt, HubError> {
        require_non_empty(ai_id, "aiId")?;
        require_non_empty(name, "name")?;

        let agent = Agent::new(
            ai_id.to_string(),
            name.to_string(),
            &capabilities,
            metadata.unwrap_or_else(|| Value::Object(Default::default())),
        );
        self.db().upsert_agent(&agent).await?;

        let total_agents = self.db().count_agents().await?;
        info!(ai_id = %ai_id, capabilities = ?capabilities, "Agent registered");

        Ok(RegisterReceipt {
            ai_id: ai_id.to_string(),
            total_agents,
        })
    }

    /// List every known agent with capabilities and metadata, in
    /// registration order.
    pub async fn list_connected_ais(&self) -> Result<AgentDirectory, HubError> {
        let agents = self.db().list_agents().await?;
        let ais: Vec<AgentInfo> = agents.iter().map(AgentInfo::from).collect();

        Ok(AgentDirectory {
            total_ais: ais.len(),
            ais,
        })
    }
}
