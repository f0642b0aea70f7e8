//! Named-operation (tool) dispatch
//!
//! The primary surface: callers POST `{tool_name, arguments}` and get back
//! the operation's JSON document or a structured error. Argument bundles use
//! the wire names agents send (`aiId`, `messageType`, `requiredCapabilities`).

use crate::api::ApiState;
use crate::error::HubError;
use crate::hub::Hub;
use axum::{extract::State, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

/// Names of every exposed tool, in dispatch order
pub const TOOL_NAMES: &[&str] = &[
    "register_ai",
    "list_connected_ais",
    "send_message",
    "read_messages",
    "share_context",
    "get_shared_context",
    "submit_task",
    "list_tasks",
    "complete_task",
];

/// A tool invocation as sent by clients
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    /// Which operation to run
    pub tool_name: String,
    /// Named-argument bundle for the operation
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterAiArgs {
    ai_id: String,
    name: String,
    #[serde(default)]
    capabilities: Vec<String>,
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageArgs {
    from_ai_id: String,
    to_ai_id: String,
    message: String,
    message_type: String,
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadMessagesArgs {
    ai_id: String,
    #[serde(default)]
    unread_only: bool,
    #[serde(default)]
    mark_as_read: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareContextArgs {
    context_id: String,
    data: Value,
    authorized_ai_ids: Option<Vec<String>>,
    ttl: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetSharedContextArgs {
    context_id: String,
    ai_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitTaskArgs {
    description: String,
    #[serde(default)]
    required_capabilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteTaskArgs {
    task_id: String,
    ai_id: String,
    #[serde(default)]
    result: Value,
    #[serde(default = "default_success")]
    success: bool,
}

fn default_success() -> bool {
    true
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, HubError> {
    serde_json::from_value(arguments).map_err(|e| HubError::Validation(e.to_string()))
}

fn to_doc<T: serde::Serialize>(value: T) -> Result<Value, HubError> {
    serde_json::to_value(value).map_err(|e| HubError::Internal(e.into()))
}

/// Route a named operation to the hub. This is the whole tool contract;
/// both tests and the HTTP handler go through it.
pub async fn dispatch(hub: &Hub, tool_name: &str, arguments: Value) -> Result<Value, HubError> {
    match tool_name {
        "register_ai" => {
            let args: RegisterAiArgs = parse_args(arguments)?;
            to_doc(
                hub.register_ai(&args.ai_id, &args.name, args.capabilities, args.metadata)
                    .await?,
            )
        }
        "list_connected_ais" => to_doc(hub.list_connected_ais().await?),
        "send_message" => {
            let args: SendMessageArgs = parse_args(arguments)?;
            to_doc(
                hub.send_message(
                    &args.from_ai_id,
                    &args.to_ai_id,
                    &args.message,
                    &args.message_type,
                    args.metadata,
                )
                .await?,
            )
        }
        "read_messages" => {
            let args: ReadMessagesArgs = parse_args(arguments)?;
            to_doc(
                hub.read_messages(&args.ai_id, args.unread_only, args.mark_as_read)
                    .await?,
            )
        }
        "share_context" => {
            let args: ShareContextArgs = parse_args(arguments)?;
            to_doc(
                hub.share_context(&args.context_id, args.data, args.authorized_ai_ids, args.ttl)
                    .await?,
            )
        }
        "get_shared_context" => {
            let args: GetSharedContextArgs = parse_args(arguments)?;
            hub.get_shared_context(&args.context_id, &args.ai_id).await
        }
        "submit_task" => {
            let args: SubmitTaskArgs = parse_args(arguments)?;
            to_doc(
                hub.submit_task(&args.description, args.required_capabilities)
                    .await?,
            )
        }
        "list_tasks" => to_doc(hub.list_tasks().await?),
        "complete_task" => {
            let args: CompleteTaskArgs = parse_args(arguments)?;
            to_doc(
                hub.complete_task(&args.task_id, &args.ai_id, args.result, args.success)
                    .await?,
            )
        }
        other => Err(HubError::UnknownTool(other.to_string())),
    }
}

/// POST /api/tools/call - Invoke a named operation
pub async fn call_tool(
    State(state): State<ApiState>,
    Json(request): Json<ToolCallRequest>,
) -> Result<Json<Value>, HubError> {
    let result = dispatch(&state.hub, &request.tool_name, request.arguments).await?;
    Ok(Json(result))
}

/// GET /api/tools - List the exposed tool names
pub async fn list_tools(State(_state): State<ApiState>) -> Json<Value> {
    Json(json!({ "tools": TOOL_NAMES }))
}
