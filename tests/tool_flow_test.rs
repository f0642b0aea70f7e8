//! End-to-end flows through the tool dispatch surface, the way external
//! agent processes drive the hub.

use ailink_hub::api::tools::dispatch;
use ailink_hub::hub::Hub;
use ailink_hub::scheduler;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

async fn call(hub: &Hub, tool: &str, args: Value) -> Value {
    dispatch(hub, tool, args).await.unwrap()
}

#[tokio::test]
async fn test_message_exchange_between_two_agents() {
    let hub = Hub::open("sqlite::memory:").await.unwrap();

    call(
        &hub,
        "register_ai",
        json!({"aiId": "requester", "name": "Requester", "capabilities": []}),
    )
    .await;
    call(
        &hub,
        "register_ai",
        json!({"aiId": "responder", "name": "Responder", "capabilities": []}),
    )
    .await;

    call(
        &hub,
        "send_message",
        json!({
            "fromAiId": "requester",
            "toAiId": "responder",
            "message": "can you quote SOL/USDC?",
            "messageType": "request"
        }),
    )
    .await;

    // Responder consumes its inbox, replies
    let inbox = call(
        &hub,
        "read_messages",
        json!({"aiId": "responder", "unreadOnly": true, "markAsRead": true}),
    )
    .await;
    assert_eq!(inbox["messageCount"], 1);
    assert_eq!(inbox["messages"][0]["from"], "requester");
    assert_eq!(inbox["messages"][0]["message"], "can you quote SOL/USDC?");

    call(
        &hub,
        "send_message",
        json!({
            "fromAiId": "responder",
            "toAiId": "requester",
            "message": "245.50",
            "messageType": "response"
        }),
    )
    .await;

    // Responder's unread view is empty after the marking read
    let again = call(
        &hub,
        "read_messages",
        json!({"aiId": "responder", "unreadOnly": true}),
    )
    .await;
    assert_eq!(again["messageCount"], 0);

    let reply = call(
        &hub,
        "read_messages",
        json!({"aiId": "requester", "unreadOnly": true}),
    )
    .await;
    assert_eq!(reply["messages"][0]["messageType"], "response");
    assert_eq!(reply["messages"][0]["message"], "245.50");
}

#[tokio::test]
async fn test_full_task_lifecycle_with_running_scheduler() {
    let hub = Arc::new(Hub::open("sqlite::memory:").await.unwrap());

    // Submit before any capable agent exists; the task must wait
    let receipt = call(
        &hub,
        "submit_task",
        json!({
            "description": "Arbitrage Opportunity Found",
            "requiredCapabilities": ["arbitrage-execution", "flash-loan"]
        }),
    )
    .await;
    let task_id = receipt["taskId"].as_str().unwrap().to_string();

    let handle = scheduler::spawn(hub.clone(), Duration::from_millis(25));
    tokio::time::sleep(Duration::from_millis(80)).await;

    let listing = call(&hub, "list_tasks", Value::Null).await;
    assert_eq!(listing["tasks"][0]["status"], "pending");

    // A capable agent joins; within one interval the task is assigned
    call(
        &hub,
        "register_ai",
        json!({
            "aiId": "executor-1",
            "name": "Executor",
            "capabilities": ["arbitrage-execution", "flash-loan", "reporting"]
        }),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    handle.abort();

    let listing = call(&hub, "list_tasks", Value::Null).await;
    assert_eq!(listing["tasks"][0]["status"], "assigned");
    assert_eq!(listing["tasks"][0]["assignedTo"], "executor-1");

    // The assignment notice is programmatically recognizable
    let inbox = call(
        &hub,
        "read_messages",
        json!({"aiId": "executor-1", "unreadOnly": true, "markAsRead": true}),
    )
    .await;
    assert_eq!(inbox["messageCount"], 1);
    let notice = &inbox["messages"][0];
    assert_eq!(notice["from"], "ailink-system");
    assert_eq!(notice["metadata"]["type"], "task_assignment");
    assert_eq!(notice["metadata"]["taskId"], task_id.as_str());

    // The executor reports completion; the submitter sees the result
    call(
        &hub,
        "complete_task",
        json!({
            "taskId": task_id,
            "aiId": "executor-1",
            "result": {"txSignature": "5KtP...", "profit_bps": 7},
            "success": true
        }),
    )
    .await;

    let listing = call(&hub, "list_tasks", Value::Null).await;
    assert_eq!(listing["tasks"][0]["status"], "completed");
    assert_eq!(listing["tasks"][0]["result"]["profit_bps"], 7);
}

#[tokio::test]
async fn test_context_sharing_between_agents() {
    let hub = Hub::open("sqlite::memory:").await.unwrap();

    call(
        &hub,
        "share_context",
        json!({
            "contextId": "opportunity-42",
            "data": {"pair": "SOL/USDC", "spread_bps": 12, "pools": ["ray", "orca"]},
            "authorizedAiIds": ["executor-1"],
            "ttl": 300
        }),
    )
    .await;

    let data = call(
        &hub,
        "get_shared_context",
        json!({"contextId": "opportunity-42", "aiId": "executor-1"}),
    )
    .await;
    assert_eq!(
        data,
        json!({"pair": "SOL/USDC", "spread_bps": 12, "pools": ["ray", "orca"]})
    );

    let err = dispatch(
        &hub,
        "get_shared_context",
        json!({"contextId": "opportunity-42", "aiId": "scanner-1"}),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "AccessDenied");
}
