//! Engine event → log bridge.
//!
//! Mirrors the engine's lifecycle and job events into structured log
//! records so the host process gets start/complete/success/failure
//! visibility without subscribing itself.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use cadence_engine::EngineEvent;

/// Spawn a task that logs every engine event until the channel closes.
pub fn spawn_event_bridge(mut events: broadcast::Receiver<EngineEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(EngineEvent::Ready) => info!("engine ready"),
                Ok(EngineEvent::JobStart { name, id }) => {
                    info!(job = %name, %id, "job started");
                }
                Ok(EngineEvent::JobComplete { name, id }) => {
                    info!(job = %name, %id, "job complete");
                }
                Ok(EngineEvent::JobSuccess { name, id }) => {
                    info!(job = %name, %id, "job succeeded");
                }
                Ok(EngineEvent::JobFail { name, id, error }) => {
                    error!(job = %name, %id, %error, "job failed");
                }
                Ok(EngineEvent::Removed { count }) => {
                    info!(removed = count, "persisted entries removed");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    info!(skipped, "event bridge lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
