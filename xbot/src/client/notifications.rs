//! Direct notifications: the callback-bearing way a bot posts a message into a chat.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use xbot_core::SyncId;

use super::method::{BotXMethod, SyncIdResult};
use crate::callbacks::{callback_error, ErrorCallbackHandlers};

/// Message content of a direct notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub status: &'static str,
    pub body: String,
    pub metadata: Value,
}

impl NotificationPayload {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: "ok",
            body: body.into(),
            metadata: Value::Object(Map::new()),
        }
    }
}

/// `POST /api/v4/botx/notifications/direct`. Accepted with a sync id; delivery is confirmed by
/// the callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendDirectNotification {
    pub group_chat_id: Uuid,
    pub notification: NotificationPayload,
}

impl SendDirectNotification {
    pub fn new(chat_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            group_chat_id: chat_id,
            notification: NotificationPayload::text(body),
        }
    }
}

impl BotXMethod for SendDirectNotification {
    type Result = SyncIdResult;
    const NAME: &'static str = "send_direct_notification";

    fn path(&self) -> String {
        "/api/v4/botx/notifications/direct".to_string()
    }

    fn callback_handlers(&self) -> ErrorCallbackHandlers {
        let mut handlers: ErrorCallbackHandlers = HashMap::new();
        handlers.insert(
            "chat_not_found".to_string(),
            callback_error("ChatNotFoundError", "Chat with specified id not found"),
        );
        handlers.insert(
            "bot_is_not_a_chat_member".to_string(),
            callback_error("BotIsNotChatMemberError", "Bot is not a chat member"),
        );
        handlers.insert(
            "event_recipients_list_is_empty".to_string(),
            callback_error(
                "FinalRecipientsListEmptyError",
                "Resulting event recipients list is empty",
            ),
        );
        handlers
    }

    fn callback_sync_id(&self, result: &SyncIdResult) -> Option<SyncId> {
        Some(result.sync_id)
    }
}
