//! Satellite HTTP dialect
//!
//! The minimal surface remote agents poll over plain HTTP instead of the
//! tool transport. Each route maps onto the same registry and message store
//! semantics as the corresponding tool. `GET /api/messages` is a consuming
//! poll: returned messages are marked read so a once-per-second poller is
//! not handed the same batch forever.

use crate::api::ApiState;
use crate::error::HubError;
use crate::hub::{Inbox, RegisterReceipt, SendReceipt};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

/// Body of POST /api/register_agent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAgentRequest {
    /// Agent id to register under
    pub ai_id: String,
    /// Display name
    pub name: String,
    /// Declared capability tags
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Free-form metadata
    pub metadata: Option<Value>,
}

/// Query string of GET /api/messages
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    /// Whose inbox to poll
    pub ai_id: String,
    /// Restrict to unread messages (default true for pollers)
    pub unread_only: Option<bool>,
}

/// Body of POST /api/chat
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Sender id
    pub from_ai_id: String,
    /// Recipient id (must be registered)
    pub to_ai_id: String,
    /// Message body
    pub message: String,
    /// Type tag; defaults to "chat"
    pub message_type: Option<String>,
    /// Optional structured metadata
    pub metadata: Option<Value>,
}

/// POST /api/register_agent - Register (or re-register) a satellite agent
pub async fn register_agent(
    State(state): State<ApiState>,
    Json(request): Json<RegisterAgentRequest>,
) -> Result<(StatusCode, Json<RegisterReceipt>), HubError> {
    let receipt = state
        .hub
        .register_ai(
            &request.ai_id,
            &request.name,
            request.capabilities,
            request.metadata,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// GET /api/messages?aiId=&unreadOnly= - Poll an inbox, consuming what is
/// returned
pub async fn poll_messages(
    State(state): State<ApiState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Inbox>, HubError> {
    let inbox = state
        .hub
        .read_messages(&query.ai_id, query.unread_only.unwrap_or(true), true)
        .await?;

    Ok(Json(inbox))
}

/// POST /api/chat - Send a message to another agent
pub async fn send_chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<SendReceipt>, HubError> {
    let receipt = state
        .hub
        .send_message(
            &request.from_ai_id,
            &request.to_ai_id,
            &request.message,
            request.message_type.as_deref().unwrap_or("chat"),
            request.metadata,
        )
        .await?;

    Ok(Json(receipt))
}
