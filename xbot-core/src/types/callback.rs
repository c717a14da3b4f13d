//! Inbound method callback: the out-of-band result of a callback-bearing outbound call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sync_id::SyncId;

/// Failure details carried by an `error` callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackFailure {
    pub sync_id: SyncId,
    pub reason: String,
    #[serde(default)]
    pub errors: Vec<Value>,
    #[serde(default)]
    pub error_data: Value,
}

/// Callback payload, discriminated by its `status` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum MethodCallback {
    #[serde(rename = "ok")]
    Success {
        sync_id: SyncId,
        #[serde(default)]
        result: Value,
    },
    #[serde(rename = "error")]
    Failure(CallbackFailure),
}

impl MethodCallback {
    pub fn sync_id(&self) -> SyncId {
        match self {
            MethodCallback::Success { sync_id, .. } => *sync_id,
            MethodCallback::Failure(failure) => failure.sync_id,
        }
    }

    /// Wire value of the discriminator, for logs and observability events.
    pub fn status(&self) -> &'static str {
        match self {
            MethodCallback::Success { .. } => "ok",
            MethodCallback::Failure(_) => "error",
        }
    }
}
