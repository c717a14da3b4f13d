//! Callback manager: suspends callback-bearing calls until their callback, a timeout, or shutdown.
//!
//! Flow:
//! 1. The method executor sends the call and reads the sync id from the response envelope
//! 2. It calls [`CallbackManager::register`] and gets a [`CallbackHandle`]
//! 3. Inbound callback ingestion calls [`CallbackManager::resolve`] with the parsed payload
//! 4. The executor awaits [`CallbackHandle::wait`]
//!
//! Every terminal transition (resolve, timer, shutdown, dropped waiter) starts with
//! `DashMap::remove`; whoever removes the entry owns the single delivery. A callback that removes
//! an entry whose deadline has already passed delivers the timeout, not the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use xbot_core::{CallbackFailure, MethodCallback, MethodError, SyncId};

use super::ErrorCallbackHandlers;
use crate::observability::{BotEvent, EventSink};

/// What a waiter receives: the callback `result` or the error for the failed/timed out/cancelled call.
pub type CallbackResult = Result<Value, MethodError>;

type PendingTable = DashMap<SyncId, PendingCallback>;

/// A call waiting for its callback.
struct PendingCallback {
    sender: oneshot::Sender<CallbackResult>,
    /// Distinguishes this registration from a later one that reuses the same sync id.
    ticket: u64,
    method: String,
    registered_at: Instant,
    /// `None` waits until the callback or shutdown.
    deadline: Option<(Instant, Duration)>,
    error_handlers: Arc<ErrorCallbackHandlers>,
    timer: Option<JoinHandle<()>>,
}

impl PendingCallback {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// The configured timeout when the deadline passed before `now`.
    fn expired_at(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .filter(|(deadline, _)| now >= *deadline)
            .map(|(_, timeout)| timeout)
    }
}

/// Counters for the callback manager.
#[derive(Debug, Default)]
pub struct CallbackStats {
    pub total_registered: AtomicU64,
    pub total_resolved: AtomicU64,
    pub total_failed: AtomicU64,
    pub total_timeouts: AtomicU64,
    /// Drained by shutdown or abandoned by the waiter.
    pub total_cancelled: AtomicU64,
    pub total_orphaned: AtomicU64,
}

/// Result of feeding one callback into the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// A waiter received the result.
    Delivered,
    /// Nobody waits for this sync id; the callback was recorded and dropped.
    Orphaned,
}

/// Table of in-flight callback-bearing calls plus the gate that closes it on shutdown.
///
/// Starts closed: call [`start`](Self::start) before registering.
pub struct CallbackManager {
    pending: Arc<PendingTable>,
    accepting: RwLock<bool>,
    next_ticket: AtomicU64,
    sink: Arc<dyn EventSink>,
    stats: Arc<CallbackStats>,
}

impl CallbackManager {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            accepting: RwLock::new(false),
            next_ticket: AtomicU64::new(0),
            sink,
            stats: Arc::new(CallbackStats::default()),
        }
    }

    /// Opens the manager for registrations.
    pub fn start(&self) {
        *self.accepting.write() = true;
        info!("Callback manager started");
    }

    pub fn is_accepting(&self) -> bool {
        *self.accepting.read()
    }

    /// Registers a waiter for `sync_id`.
    ///
    /// `timeout = None` waits until the callback or shutdown; `Some(Duration::ZERO)` times out
    /// immediately. Must be called inside a tokio runtime when a non-zero timeout is given.
    pub fn register(
        &self,
        sync_id: SyncId,
        method: &str,
        timeout: Option<Duration>,
        error_handlers: Arc<ErrorCallbackHandlers>,
    ) -> Result<CallbackHandle, MethodError> {
        // Held until the entry is inserted so shutdown cannot drain in between.
        let accepting = self.accepting.read();
        if !*accepting {
            debug!(sync_id = %sync_id, method = %method, "Registration rejected: shutting down");
            return Err(MethodError::ShuttingDown { sync_id });
        }

        let (sender, receiver) = oneshot::channel();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        match self.pending.entry(sync_id) {
            Entry::Occupied(_) => {
                warn!(sync_id = %sync_id, method = %method, "Sync id is already awaited");
                return Err(MethodError::DuplicateSyncId { sync_id });
            }
            Entry::Vacant(slot) => {
                self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
                if timeout == Some(Duration::ZERO) {
                    drop(slot);
                    time_out(
                        sender,
                        sync_id,
                        method,
                        Duration::ZERO,
                        self.sink.as_ref(),
                        &self.stats,
                    );
                } else {
                    let registered_at = Instant::now();
                    let timer = timeout.map(|timeout| self.arm_timer(sync_id, ticket, timeout));
                    slot.insert(PendingCallback {
                        sender,
                        ticket,
                        method: method.to_string(),
                        registered_at,
                        deadline: timeout.and_then(|timeout| {
                            registered_at
                                .checked_add(timeout)
                                .map(|deadline| (deadline, timeout))
                        }),
                        error_handlers,
                        timer,
                    });
                }
            }
        }
        drop(accepting);

        debug!(
            sync_id = %sync_id,
            method = %method,
            timeout_ms = timeout.map(|t| t.as_millis() as u64),
            "Registered pending callback"
        );

        Ok(CallbackHandle {
            sync_id,
            ticket,
            receiver,
            pending: Arc::clone(&self.pending),
            stats: Arc::clone(&self.stats),
        })
    }

    fn arm_timer(&self, sync_id: SyncId, ticket: u64, timeout: Duration) -> JoinHandle<()> {
        let pending = Arc::clone(&self.pending);
        let sink = Arc::clone(&self.sink);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            expire(&pending, sync_id, ticket, timeout, sink.as_ref(), &stats);
        })
    }

    /// Delivers the timeout to an already removed entry whose deadline passed before its callback.
    fn expire_late(
        &self,
        sync_id: SyncId,
        entry: PendingCallback,
        timeout: Duration,
        status: &str,
    ) -> ResolveOutcome {
        debug!(sync_id = %sync_id, method = %entry.method, "Callback arrived after its deadline");
        time_out(
            entry.sender,
            sync_id,
            &entry.method,
            timeout,
            self.sink.as_ref(),
            &self.stats,
        );
        self.orphan(sync_id, status)
    }

    /// Feeds a parsed callback into the table.
    pub fn resolve(&self, callback: MethodCallback) -> ResolveOutcome {
        match callback {
            MethodCallback::Success { sync_id, result } => self.resolve_success(sync_id, result),
            MethodCallback::Failure(failure) => self.resolve_failure(failure),
        }
    }

    /// Delivers a successful callback result to its waiter.
    #[instrument(skip(self, result))]
    pub fn resolve_success(&self, sync_id: SyncId, result: Value) -> ResolveOutcome {
        let Some((_, mut entry)) = self.pending.remove(&sync_id) else {
            return self.orphan(sync_id, "ok");
        };
        entry.disarm();
        if let Some(timeout) = entry.expired_at(Instant::now()) {
            return self.expire_late(sync_id, entry, timeout, "ok");
        }
        self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
        debug!(
            sync_id = %sync_id,
            method = %entry.method,
            elapsed_ms = entry.registered_at.elapsed().as_millis() as u64,
            "Callback resolved"
        );
        self.deliver(sync_id, entry, Ok(result))
    }

    /// Delivers a failed callback: the reason is looked up in the waiter's error handlers, unknown
    /// reasons become [`MethodError::CallbackFailed`].
    #[instrument(skip(self, failure), fields(sync_id = %failure.sync_id, reason = %failure.reason))]
    pub fn resolve_failure(&self, failure: CallbackFailure) -> ResolveOutcome {
        let sync_id = failure.sync_id;
        let Some((_, mut entry)) = self.pending.remove(&sync_id) else {
            return self.orphan(sync_id, "error");
        };
        entry.disarm();
        if let Some(timeout) = entry.expired_at(Instant::now()) {
            return self.expire_late(sync_id, entry, timeout, "error");
        }
        self.stats.total_failed.fetch_add(1, Ordering::Relaxed);

        let error = match entry.error_handlers.get(&failure.reason) {
            Some(build) => build(failure),
            None => MethodError::CallbackFailed(failure),
        };
        info!(
            sync_id = %sync_id,
            method = %entry.method,
            error = %error,
            "Callback failed"
        );
        self.deliver(sync_id, entry, Err(error))
    }

    fn deliver(
        &self,
        sync_id: SyncId,
        entry: PendingCallback,
        result: CallbackResult,
    ) -> ResolveOutcome {
        match entry.sender.send(result) {
            Ok(()) => ResolveOutcome::Delivered,
            Err(_) => {
                debug!(sync_id = %sync_id, "Callback waiter already gone");
                self.orphan(sync_id, "dropped")
            }
        }
    }

    fn orphan(&self, sync_id: SyncId, status: &str) -> ResolveOutcome {
        self.stats.total_orphaned.fetch_add(1, Ordering::Relaxed);
        self.sink.record(BotEvent::OrphanCallback {
            sync_id,
            status: status.to_string(),
        });
        ResolveOutcome::Orphaned
    }

    /// Closes the gate, then cancels every pending callback with [`MethodError::ShuttingDown`].
    /// Returns how many waiters were cancelled; a second call is a no-op.
    pub fn shutdown(&self) -> usize {
        {
            let mut accepting = self.accepting.write();
            if !*accepting {
                return 0;
            }
            *accepting = false;
        }

        let sync_ids: Vec<SyncId> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut cancelled = 0;
        for sync_id in sync_ids {
            if let Some((_, mut entry)) = self.pending.remove(&sync_id) {
                entry.disarm();
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                self.sink.record(BotEvent::CallbackCancelled {
                    sync_id,
                    method: entry.method.clone(),
                });
                let _ = entry.sender.send(Err(MethodError::ShuttingDown { sync_id }));
                cancelled += 1;
            }
        }

        info!(cancelled = cancelled, "Callback manager shut down");
        cancelled
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, sync_id: &SyncId) -> bool {
        self.pending.contains_key(sync_id)
    }

    pub fn stats(&self) -> &CallbackStats {
        &self.stats
    }
}

impl Drop for CallbackManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Timer side of a deadline. Only removes the registration that armed it.
fn expire(
    pending: &PendingTable,
    sync_id: SyncId,
    ticket: u64,
    timeout: Duration,
    sink: &dyn EventSink,
    stats: &CallbackStats,
) -> bool {
    match pending.remove_if(&sync_id, |_, entry| entry.ticket == ticket) {
        Some((_, entry)) => {
            time_out(entry.sender, sync_id, &entry.method, timeout, sink, stats);
            true
        }
        None => false,
    }
}

fn time_out(
    sender: oneshot::Sender<CallbackResult>,
    sync_id: SyncId,
    method: &str,
    timeout: Duration,
    sink: &dyn EventSink,
    stats: &CallbackStats,
) {
    stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
    sink.record(BotEvent::CallbackTimedOut {
        sync_id,
        method: method.to_string(),
        timeout,
    });
    let _ = sender.send(Err(MethodError::CallbackNotReceived { sync_id, timeout }));
}

/// The waiting side of one registration. Dropping it before resolution removes the entry.
pub struct CallbackHandle {
    sync_id: SyncId,
    ticket: u64,
    receiver: oneshot::Receiver<CallbackResult>,
    pending: Arc<PendingTable>,
    stats: Arc<CallbackStats>,
}

impl CallbackHandle {
    pub fn sync_id(&self) -> SyncId {
        self.sync_id
    }

    /// Suspends until the callback is resolved, failed, timed out, or cancelled.
    pub async fn wait(mut self) -> CallbackResult {
        let sync_id = self.sync_id;
        match (&mut self.receiver).await {
            Ok(result) => result,
            Err(_) => Err(MethodError::ShuttingDown { sync_id }),
        }
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        let ticket = self.ticket;
        if let Some((_, mut entry)) = self
            .pending
            .remove_if(&self.sync_id, |_, entry| entry.ticket == ticket)
        {
            entry.disarm();
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(
                sync_id = %self.sync_id,
                method = %entry.method,
                "Callback waiter dropped before resolution"
            );
        }
    }
}
