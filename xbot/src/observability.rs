//! Observability sink for events that are reported rather than returned to a caller.
//!
//! Orphan callbacks, callback timeouts / cancellations and handler failures go through an
//! [`EventSink`]. Recording is synchronous and must not block: implementations log, count, or push
//! into a channel. [`TracingSink`] is the default and writes through `tracing`.

use std::time::Duration;

use tracing::{error, info, warn};
use xbot_core::SyncId;

/// Structured event emitted by the dispatcher and the callback manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    /// Callback with no waiting entry: never registered, already resolved, or already timed out.
    OrphanCallback { sync_id: SyncId, status: String },
    CallbackTimedOut {
        sync_id: SyncId,
        method: String,
        timeout: Duration,
    },
    /// Pending callback drained by shutdown.
    CallbackCancelled { sync_id: SyncId, method: String },
    HandlerFailed {
        command: String,
        sync_id: SyncId,
        error: String,
    },
    HandlerPanicked {
        command: String,
        sync_id: SyncId,
        message: String,
    },
}

/// Receiver of [`BotEvent`]s. Fire-and-forget.
pub trait EventSink: Send + Sync {
    fn record(&self, event: BotEvent);
}

/// Writes every event as a `tracing` record.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: BotEvent) {
        match event {
            BotEvent::OrphanCallback { sync_id, status } => {
                warn!(
                    sync_id = %sync_id,
                    status = %status,
                    "Callback not found: bot don't wait callback or it was already resolved"
                );
            }
            BotEvent::CallbackTimedOut {
                sync_id,
                method,
                timeout,
            } => {
                warn!(
                    sync_id = %sync_id,
                    method = %method,
                    timeout_ms = timeout.as_millis() as u64,
                    "Callback hasn't been received in time"
                );
            }
            BotEvent::CallbackCancelled { sync_id, method } => {
                info!(sync_id = %sync_id, method = %method, "Pending callback cancelled by shutdown");
            }
            BotEvent::HandlerFailed {
                command,
                sync_id,
                error,
            } => {
                error!(command = %command, sync_id = %sync_id, error = %error, "Handler failed");
            }
            BotEvent::HandlerPanicked {
                command,
                sync_id,
                message,
            } => {
                error!(command = %command, sync_id = %sync_id, panic = %message, "Handler panicked");
            }
        }
    }
}
