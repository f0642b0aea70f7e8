// Durable storage module
// SQLite-backed stores for agents, messages, shared contexts, and tasks

pub mod db;
pub mod models;

pub use db::HubDb;
pub use models::{Agent, AiId, Message, SharedContext, Task, TaskStatus};
