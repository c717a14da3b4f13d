//! Error types for the bot client.
//!
//! [`XbotError`] is the top-level error; [`HandlerError`] covers registry and dispatch failures;
//! [`MethodError`] is what an outbound API call (and the callback it may wait for) can fail with.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::types::{CallbackFailure, SyncId};

/// Top-level error for xbot (inbound payloads, registry, outbound methods, config, IO).
#[derive(Error, Debug)]
pub enum XbotError {
    #[error("Malformed command: {0}")]
    MalformedCommand(String),

    #[error("Malformed callback: {0}")]
    MalformedCallback(String),

    #[error("Malformed status request: {0}")]
    MalformedStatusRequest(String),

    #[error("No credentials for bot {0}")]
    UnknownBotAccount(Uuid),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Method(#[from] MethodError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced while registering or dispatching handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    #[error("Handler for command `{0}` already registered")]
    DuplicateCommand(String),

    #[error("Default handler already registered")]
    DuplicateDefault,

    #[error("State error: {0}")]
    State(String),
}

/// Raw outcome of an outbound call, kept on remote errors for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub method: String,
    pub status: u16,
    pub body: String,
}

impl fmt::Display for RemoteResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} returned {}: {}", self.method, self.status, self.body)
    }
}

/// Errors of outbound API methods, including the callback phase of callback-bearing methods.
#[derive(Error, Debug)]
pub enum MethodError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request serialization failed for {method}: {detail}")]
    Serialization { method: String, detail: String },

    #[error("Invalid bot account: {0}")]
    InvalidBotAccount(RemoteResponse),

    #[error("Permission denied: {0}")]
    PermissionDenied(RemoteResponse),

    #[error("Chat not found: {0}")]
    ChatNotFound(RemoteResponse),

    #[error("Chat creation prohibited: {0}")]
    ChatCreationProhibited(RemoteResponse),

    #[error("Chat creation failed: {0}")]
    ChatCreation(RemoteResponse),

    #[error("Unexpected status code: {0}")]
    Remote(RemoteResponse),

    #[error("Invalid response payload ({detail}): {response}")]
    InvalidResponse {
        response: RemoteResponse,
        detail: String,
    },

    #[error(
        "BotX method call with sync_id `{}` failed with reason `{}`: {}",
        .0.sync_id, .0.reason, .0.error_data
    )]
    CallbackFailed(CallbackFailure),

    #[error(
        "{kind}: {comment} (sync_id `{}`, reason `{}`)",
        .failure.sync_id, .failure.reason
    )]
    CallbackRejected {
        kind: String,
        comment: String,
        failure: CallbackFailure,
    },

    #[error("Callback for sync_id `{sync_id}` hasn't been received in {timeout:?}")]
    CallbackNotReceived { sync_id: SyncId, timeout: Duration },

    #[error("Bot is shutting down, callback for sync_id `{sync_id}` won't be delivered")]
    ShuttingDown { sync_id: SyncId },

    #[error("Callback for sync_id `{sync_id}` is already awaited")]
    DuplicateSyncId { sync_id: SyncId },
}

impl MethodError {
    /// Sync id the error refers to, for errors raised in the callback phase.
    pub fn sync_id(&self) -> Option<SyncId> {
        match self {
            MethodError::CallbackFailed(failure) => Some(failure.sync_id),
            MethodError::CallbackRejected { failure, .. } => Some(failure.sync_id),
            MethodError::CallbackNotReceived { sync_id, .. }
            | MethodError::ShuttingDown { sync_id }
            | MethodError::DuplicateSyncId { sync_id } => Some(*sync_id),
            _ => None,
        }
    }
}

/// Result type for core operations; uses [`XbotError`].
pub type Result<T> = std::result::Result<T, XbotError>;
