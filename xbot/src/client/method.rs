//! The [`BotXMethod`] trait: what one outbound API method looks like to the executor.

use std::collections::HashMap;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use xbot_core::{MethodError, RemoteResponse, SyncId};

use crate::callbacks::ErrorCallbackHandlers;

/// Status code to error constructor. Consulted before the generic non-2xx handling.
pub type StatusHandlers = HashMap<u16, fn(RemoteResponse) -> MethodError>;

/// Handlers shared by every authorized method: 401 means the bot account credentials are wrong.
pub fn default_status_handlers() -> StatusHandlers {
    let mut handlers: StatusHandlers = HashMap::new();
    handlers.insert(401, MethodError::InvalidBotAccount);
    handlers
}

/// One outbound BotX API method.
///
/// The request body is the serde serialization of the method value. A method is
/// callback-bearing when [`callback_sync_id`](Self::callback_sync_id) returns a sync id for the
/// parsed result.
pub trait BotXMethod: Serialize + Send + Sync {
    /// `result` field of the `{"status": "ok", "result": ...}` envelope.
    type Result: DeserializeOwned + Send + 'static;

    /// Method name used in logs and errors.
    const NAME: &'static str;

    /// Path relative to the account base URL, e.g. `/api/v3/botx/chats/create`.
    fn path(&self) -> String;

    fn http_method(&self) -> Method {
        Method::POST
    }

    fn body(&self) -> Result<Option<Value>, MethodError> {
        serde_json::to_value(self)
            .map(Some)
            .map_err(|e| MethodError::Serialization {
                method: Self::NAME.to_string(),
                detail: e.to_string(),
            })
    }

    fn status_handlers(&self) -> StatusHandlers {
        default_status_handlers()
    }

    /// Reason to error constructor for `error` callbacks.
    fn callback_handlers(&self) -> ErrorCallbackHandlers {
        HashMap::new()
    }

    fn callback_sync_id(&self, _result: &Self::Result) -> Option<SyncId> {
        None
    }
}

/// Result of one executed method, plus the callback `result` when the call waited for it.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOutcome<T> {
    pub result: T,
    pub callback: Option<Value>,
}

/// Successful response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    #[allow(dead_code)]
    pub status: ApiStatus,
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub(crate) enum ApiStatus {
    #[serde(rename = "ok")]
    Ok,
}

/// `{"sync_id": ...}` result returned by callback-bearing methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIdResult {
    pub sync_id: SyncId,
}
