//! Background assignment loop
//!
//! Runs one assignment pass per tick. Passes never overlap (the tick is
//! awaited sequentially) and per-tick faults are logged and swallowed so a
//! transient store error never terminates the loop.

use crate::hub::Hub;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn the scheduler loop on the given interval
pub fn spawn(hub: Arc<Hub>, interval: Duration) -> JoinHandle<()> {
    info!("Scheduler starting with {}ms interval", interval.as_millis());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so freshly submitted
        // tasks always wait at most one interval, never zero-with-no-agents.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match hub.assign_pending_tasks().await {
                Ok(0) => {}
                Ok(assigned) => debug!("Scheduler pass assigned {} task(s)", assigned),
                Err(e) => warn!("Scheduler pass failed, retrying next tick: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loop_assigns_within_one_interval() {
        let hub = Arc::new(Hub::open("sqlite::memory:").await.unwrap());
        hub.register_ai("worker", "Worker", vec!["exec".to_string()], None)
            .await
            .unwrap();
        hub.submit_task("work", vec!["exec".to_string()])
            .await
            .unwrap();

        let handle = spawn(hub.clone(), Duration::from_millis(20));

        // Wait a few intervals, then check the task moved on its own
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        let listing = hub.list_tasks().await.unwrap();
        assert_eq!(
            listing.tasks[0].status,
            crate::store::TaskStatus::Assigned
        );
    }
}
