//! Message store operations
//!
//! Point-to-point messages owned by the recipient's inbox. Sends to an
//! unregistered recipient fail with `UnknownRecipient`; reads return messages
//! in send order and only flip the read flag when the caller asks for it.

use crate::error::HubError;
use crate::hub::{require_non_empty, Hub};
use crate::store::Message;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// Result of a `send_message` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    /// Generated id of the stored message
    pub message_id: String,
    /// The recipient the message was appended for
    pub to: String,
}

/// One message as returned to a reader
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDoc {
    /// Unique message id
    pub id: String,
    /// Sender id
    pub from: String,
    /// Recipient id
    pub to: String,
    /// Message body
    pub message: String,
    /// Free-form type tag
    pub message_type: String,
    /// Structured metadata, if the sender attached any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Read flag as of this call (before any mark-as-read side effect)
    pub read: bool,
    /// Send time (Unix timestamp)
    pub timestamp: i64,
}

impl From<&Message> for MessageDoc {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            from: message.from_ai_id.clone(),
            to: message.to_ai_id.clone(),
            message: message.body.clone(),
            message_type: message.message_type.clone(),
            metadata: message.metadata_value(),
            read: message.read,
            timestamp: message.sent_at,
        }
    }
}

/// Result of a `read_messages` call
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    /// Number of messages returned
    pub message_count: usize,
    /// Messages in send order
    pub messages: Vec<MessageDoc>,
}

impl Hub {
    /// Append a message to the recipient's inbox. The sender does not have
    /// to be registered; the recipient does.
    pub async fn send_message(
        &self,
        from_ai_id: &str,
        to_ai_id: &str,
        message: &str,
        message_type: &str,
        metadata: Option<Value>,
    ) -> Result<SendReceipt, HubError> {
        require_non_empty(from_ai_id, "fromAiId")?;
        require_non_empty(to_ai_id, "toAiId")?;
        require_non_empty(message_type, "messageType")?;

        if self.db().get_agent(to_ai_id).await?.is_none() {
            return Err(HubError::UnknownRecipient(to_ai_id.to_string()));
        }

        let stored = Message::new(
            Uuid::new_v4().to_string(),
            from_ai_id.to_string(),
            to_ai_id.to_string(),
            message.to_string(),
            message_type.to_string(),
            metadata,
        );
        self.db().insert_message(&stored).await?;

        debug!(from = %from_ai_id, to = %to_ai_id, "Message delivered");
        Ok(SendReceipt {
            message_id: stored.id,
            to: to_ai_id.to_string(),
        })
    }

    /// Read a recipient's messages in send order. With `unread_only` the
    /// result is filtered to unread messages; with `mark_as_read` every
    /// returned message is flipped to read as a side effect of this call.
    pub async fn read_messages(
        &self,
        ai_id: &str,
        unread_only: bool,
        mark_as_read: bool,
    ) -> Result<Inbox, HubError> {
        require_non_empty(ai_id, "aiId")?;

        let messages = self.db().messages_for(ai_id, unread_only).await?;
        let docs: Vec<MessageDoc> = messages.iter().map(MessageDoc::from).collect();

        if mark_as_read {
            if let Some(last) = messages.last() {
                self.db().mark_read(ai_id, last.seq).await?;
            }
        }

        Ok(Inbox {
            message_count: docs.len(),
            messages: docs,
        })
    }
}
