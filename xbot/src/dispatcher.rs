//! Command dispatcher: resolves a handler for each inbound command and runs it as its own task.
//!
//! `dispatch` returns as soon as the unit is scheduled. Errors and panics stay inside the unit and
//! are reported to the [`EventSink`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};
use xbot_core::{HandlerError, IncomingCommand, Result};

use crate::bot::Bot;
use crate::observability::{BotEvent, EventSink};
use crate::registry::{HandlerEntry, HandlerRegistry};

/// What happened to one inbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler unit was spawned; it may still be running.
    Scheduled { command: String },
    /// No exact match and no default handler (system events never fall back to the default).
    NotFound { command: String },
}

pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    tasks: Mutex<JoinSet<()>>,
    closed: AtomicBool,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry,
            tasks: Mutex::new(JoinSet::new()),
            closed: AtomicBool::new(false),
            sink,
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Resolves the handler for `command` and spawns it. Must be called inside a tokio runtime.
    #[instrument(skip(self, command, bot), fields(command = %command.command, sync_id = %command.sync_id))]
    pub fn dispatch(&self, command: IncomingCommand, bot: Bot) -> Result<DispatchOutcome> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HandlerError::State("dispatcher is stopped".to_string()).into());
        }

        let entry = if command.is_system_event() {
            self.registry.get(&command.command)
        } else {
            self.registry.lookup(&command.command)
        };
        let Some(entry) = entry else {
            info!("Handler not found");
            return Ok(DispatchOutcome::NotFound {
                command: command.command,
            });
        };

        let key = command.command.clone();
        let mut tasks = self.tasks.lock();
        // Checked again under the lock: shutdown closes and takes the set while holding it.
        if self.closed.load(Ordering::Acquire) {
            return Err(HandlerError::State("dispatcher is stopped".to_string()).into());
        }
        while tasks.try_join_next().is_some() {}
        tasks.spawn(run_unit(entry, command, bot, Arc::clone(&self.sink)));
        debug!(in_flight = tasks.len(), "Handler scheduled");

        Ok(DispatchOutcome::Scheduled { command: key })
    }

    /// Handler units not yet finished.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Accepts dispatches again after [`shutdown`](Self::shutdown).
    pub fn start(&self) {
        let _guard = self.tasks.lock();
        self.closed.store(false, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Rejects further dispatches and waits for every in-flight unit. Idempotent.
    pub async fn shutdown(&self) {
        let mut tasks = {
            let mut guard = self.tasks.lock();
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *guard)
        };

        let pending = tasks.len();
        if pending > 0 {
            info!(in_flight = pending, "Waiting for handlers to finish");
        }
        while tasks.join_next().await.is_some() {}
        debug!("Dispatcher stopped");
    }
}

async fn run_unit(
    entry: Arc<HandlerEntry>,
    command: IncomingCommand,
    bot: Bot,
    sink: Arc<dyn EventSink>,
) {
    let key = command.command.clone();
    let sync_id = command.sync_id;
    debug!(command = %key, handler = %entry.command(), sync_id = %sync_id, "Handler started");

    let outcome = AssertUnwindSafe(async move { entry.call(command, bot).await })
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => debug!(command = %key, sync_id = %sync_id, "Handler finished"),
        Ok(Err(e)) => sink.record(BotEvent::HandlerFailed {
            command: key,
            sync_id,
            error: format!("{:#}", e),
        }),
        Err(panic) => sink.record(BotEvent::HandlerPanicked {
            command: key,
            sync_id,
            message: panic_message(panic.as_ref()),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
