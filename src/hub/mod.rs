//! The hub's core operation contract
//!
//! `Hub` owns the durable stores and exposes every named operation an agent
//! can invoke: registration, messaging, shared context, and the task queue.
//! Transports (tool dispatch, the satellite HTTP dialect) are thin mappings
//! over these methods, so the semantics stay identical across them.

pub mod context;
pub mod messages;
pub mod registry;
pub mod tasks;

use crate::error::HubError;
use crate::store::HubDb;

pub use context::ShareReceipt;
pub use messages::{Inbox, MessageDoc, SendReceipt};
pub use registry::{AgentDirectory, AgentInfo, RegisterReceipt};
pub use tasks::{CompletionReceipt, SubmitReceipt, TaskDoc, TaskListing};

/// Sender id used for scheduler-generated assignment notices
pub const SYSTEM_SENDER: &str = "ailink-system";

/// Message type tag on assignment notices
pub const TASK_ASSIGNMENT_TYPE: &str = "task_assignment";

/// The coordination hub: durable stores plus the operations over them
pub struct Hub {
    db: HubDb,
}

impl Hub {
    /// Open the hub against the database at `db_path`, creating it if
    /// missing. All state left by a previous process is visible afterwards.
    pub async fn open(db_path: &str) -> Result<Self, HubError> {
        let db = HubDb::new(db_path).await?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &HubDb {
        &self.db
    }
}

/// Reject empty or whitespace-only required string arguments
pub(crate) fn require_non_empty(value: &str, field: &str) -> Result<(), HubError> {
    if value.trim().is_empty() {
        return Err(HubError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("a1", "aiId").is_ok());
        assert!(require_non_empty("", "aiId").is_err());
        assert!(require_non_empty("   ", "aiId").is_err());
    }
}
