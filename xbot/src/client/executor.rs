//! Method executor: send, map the response, and optionally suspend on the callback.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use xbot_core::{MethodError, RemoteResponse};

use super::method::{ApiEnvelope, BotXMethod, MethodOutcome, StatusHandlers};
use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::callbacks::CallbackManager;
use crate::config::BotAccount;

/// Runs [`BotXMethod`]s against a [`Transport`], correlating callbacks through the
/// [`CallbackManager`].
pub struct MethodExecutor {
    transport: Arc<dyn Transport>,
    callbacks: Arc<CallbackManager>,
    default_callback_timeout: Option<Duration>,
}

impl MethodExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        callbacks: Arc<CallbackManager>,
        default_callback_timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            callbacks,
            default_callback_timeout,
        }
    }

    pub fn default_callback_timeout(&self) -> Option<Duration> {
        self.default_callback_timeout
    }

    /// Executes `method` for `account`.
    ///
    /// For callback-bearing methods with `wait_callback`, suspends until the callback resolves;
    /// `callback_timeout` falls back to the configured default. Without waiting, the result is
    /// returned as soon as the response is parsed and a later callback is an orphan.
    #[instrument(skip(self, account, method), fields(method = M::NAME, bot_id = %account.id))]
    pub async fn execute<M: BotXMethod>(
        &self,
        account: &BotAccount,
        method: &M,
        wait_callback: bool,
        callback_timeout: Option<Duration>,
    ) -> Result<MethodOutcome<M::Result>, MethodError> {
        let request = HttpRequest {
            method: method.http_method(),
            url: format!("{}{}", account.base_url(), method.path()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: method.body()?,
        };

        let response = self.transport.send(request).await?;
        let result: M::Result = parse_response(M::NAME, &method.status_handlers(), response)?;

        let Some(sync_id) = method.callback_sync_id(&result) else {
            return Ok(MethodOutcome {
                result,
                callback: None,
            });
        };
        if !wait_callback {
            debug!(sync_id = %sync_id, "Not waiting for callback");
            return Ok(MethodOutcome {
                result,
                callback: None,
            });
        }

        let timeout = callback_timeout.or(self.default_callback_timeout);
        let handle = self.callbacks.register(
            sync_id,
            M::NAME,
            timeout,
            Arc::new(method.callback_handlers()),
        )?;
        let callback = handle.wait().await?;

        Ok(MethodOutcome {
            result,
            callback: Some(callback),
        })
    }
}

/// Mapped status first, then any other non-2xx, then the `{"status": "ok", "result": ...}`
/// envelope.
fn parse_response<T: DeserializeOwned>(
    method: &str,
    handlers: &StatusHandlers,
    response: HttpResponse,
) -> Result<T, MethodError> {
    let remote = |response: HttpResponse| RemoteResponse {
        method: method.to_string(),
        status: response.status,
        body: response.body,
    };

    if let Some(build) = handlers.get(&response.status) {
        return Err(build(remote(response)));
    }
    if !response.is_success() {
        return Err(MethodError::Remote(remote(response)));
    }

    match serde_json::from_str::<ApiEnvelope<T>>(&response.body) {
        Ok(envelope) => Ok(envelope.result),
        Err(e) => Err(MethodError::InvalidResponse {
            response: remote(response),
            detail: e.to_string(),
        }),
    }
}
