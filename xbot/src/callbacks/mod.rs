//! Callback correlation: pending outbound calls keyed by sync id, resolved by inbound callbacks,
//! timers, or shutdown.

mod manager;

use std::collections::HashMap;
use std::sync::Arc;

use xbot_core::{CallbackFailure, MethodError};

pub use manager::{CallbackHandle, CallbackManager, CallbackResult, CallbackStats, ResolveOutcome};

/// Builds the error delivered to the waiter when a failed callback carries a known reason.
pub type CallbackErrorFn = Arc<dyn Fn(CallbackFailure) -> MethodError + Send + Sync>;

/// Reason (`chat_not_found`, ...) to error constructor, per outbound method.
pub type ErrorCallbackHandlers = HashMap<String, CallbackErrorFn>;

/// Constructor producing [`MethodError::CallbackRejected`] with the given kind and comment.
pub fn callback_error(kind: &'static str, comment: impl Into<String>) -> CallbackErrorFn {
    let comment = comment.into();
    Arc::new(move |failure| MethodError::CallbackRejected {
        kind: kind.to_string(),
        comment: comment.clone(),
        failure,
    })
}
