//! Inbound command: one parsed webhook payload, consumed by exactly one handler invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{chat::Chat, sync_id::SyncId, user::Sender};
use crate::error::{Result, XbotError};

/// Who produced the command: a user message or a platform system event (`system:chat_created`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    User,
    System,
}

/// A parsed inbound command with sender and chat context. `raw` keeps the inbound payload for
/// fields the typed model does not cover.
#[derive(Debug, Clone)]
pub struct IncomingCommand {
    pub bot_id: Uuid,
    pub sync_id: SyncId,
    pub source_sync_id: Option<SyncId>,
    /// Full message body, e.g. `/echo hello world`.
    pub body: String,
    /// First token of the body for user commands (`/echo`); the whole body for system events.
    pub command: String,
    /// Remainder of the body after the command token, trimmed.
    pub argument: String,
    pub command_type: CommandType,
    pub data: Value,
    pub metadata: Value,
    pub sender: Sender,
    pub chat: Chat,
    pub proto_version: Option<u32>,
    pub received_at: DateTime<Utc>,
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct RawBotCommand {
    bot_id: Uuid,
    sync_id: SyncId,
    #[serde(default)]
    source_sync_id: Option<SyncId>,
    command: RawCommandBody,
    from: RawSender,
    #[serde(default)]
    proto_version: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawCommandBody {
    body: String,
    command_type: CommandType,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct RawSender {
    #[serde(default)]
    user_huid: Option<Uuid>,
    #[serde(default)]
    group_chat_id: Option<Uuid>,
    #[serde(default)]
    chat_type: Option<String>,
    host: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    ad_login: Option<String>,
    #[serde(default)]
    ad_domain: Option<String>,
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default)]
    is_creator: Option<bool>,
    #[serde(default)]
    locale: Option<String>,
}

impl IncomingCommand {
    /// Parses a raw webhook payload. Schema violations become [`XbotError::MalformedCommand`].
    pub fn from_raw(raw: Value) -> Result<Self> {
        let parsed: RawBotCommand = serde_json::from_value(raw.clone())
            .map_err(|e| XbotError::MalformedCommand(e.to_string()))?;

        let body = parsed.command.body;
        let (command, argument) = match parsed.command.command_type {
            CommandType::System => (body.trim().to_string(), String::new()),
            CommandType::User => split_body(&body),
        };

        let from = parsed.from;
        Ok(Self {
            bot_id: parsed.bot_id,
            sync_id: parsed.sync_id,
            source_sync_id: parsed.source_sync_id,
            body,
            command,
            argument,
            command_type: parsed.command.command_type,
            data: parsed.command.data,
            metadata: parsed.command.metadata,
            sender: Sender {
                huid: from.user_huid,
                username: from.username,
                ad_login: from.ad_login,
                ad_domain: from.ad_domain,
                is_chat_admin: from.is_admin,
                is_chat_creator: from.is_creator,
                locale: from.locale,
            },
            chat: Chat {
                id: from.group_chat_id,
                chat_type: from.chat_type.unwrap_or_default(),
                host: from.host,
            },
            proto_version: parsed.proto_version,
            received_at: Utc::now(),
            raw,
        })
    }

    pub fn is_system_event(&self) -> bool {
        self.command_type == CommandType::System
    }
}

fn split_body(body: &str) -> (String, String) {
    let trimmed = body.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(body: &str, command_type: &str) -> Value {
        json!({
            "bot_id": "24348246-6791-4ac0-9d86-b948cd6a0e46",
            "command": {
                "body": body,
                "command_type": command_type,
                "data": {},
                "metadata": {},
            },
            "attachments": [],
            "async_files": [],
            "entities": [],
            "source_sync_id": null,
            "sync_id": "6f40a492-4b5f-54f3-87ee-77126d825b51",
            "from": {
                "ad_domain": null,
                "ad_login": null,
                "chat_type": "chat",
                "device": null,
                "device_meta": {"permissions": null, "pushes": false, "timezone": "Europe/Moscow"},
                "group_chat_id": "30dc1980-643a-00ad-37fc-7cc10d74e935",
                "host": "cts.example.com",
                "is_admin": true,
                "is_creator": true,
                "locale": "en",
                "user_huid": "f16cdc5f-6366-5552-9ecd-c36290ab3d11",
                "username": null,
            },
            "proto_version": 4,
        })
    }

    #[test]
    fn test_parse_user_command_splits_argument() {
        let cmd = IncomingCommand::from_raw(payload("/echo  hello world ", "user")).unwrap();
        assert_eq!(cmd.command, "/echo");
        assert_eq!(cmd.argument, "hello world");
        assert_eq!(cmd.command_type, CommandType::User);
        assert_eq!(cmd.chat.host, "cts.example.com");
        assert_eq!(cmd.chat.chat_type, "chat");
        assert_eq!(cmd.sender.is_chat_admin, Some(true));
        assert_eq!(cmd.proto_version, Some(4));
        assert_eq!(
            cmd.sync_id.to_string(),
            "6f40a492-4b5f-54f3-87ee-77126d825b51"
        );
    }

    #[test]
    fn test_parse_system_event_keeps_body_as_command() {
        let cmd = IncomingCommand::from_raw(payload("system:chat_created", "system")).unwrap();
        assert!(cmd.is_system_event());
        assert_eq!(cmd.command, "system:chat_created");
        assert!(cmd.argument.is_empty());
    }

    #[test]
    fn test_raw_payload_is_kept() {
        let raw = payload("/debug", "user");
        let cmd = IncomingCommand::from_raw(raw.clone()).unwrap();
        assert_eq!(cmd.raw, raw);
        assert_eq!(cmd.raw["from"]["device_meta"]["timezone"], "Europe/Moscow");
    }

    #[test]
    fn test_malformed_payload() {
        let err = IncomingCommand::from_raw(json!({"incorrect": "request"})).unwrap_err();
        assert!(matches!(err, XbotError::MalformedCommand(_)));
    }

    #[test]
    fn test_unknown_command_type_is_malformed() {
        let err = IncomingCommand::from_raw(payload("/debug", "robot")).unwrap_err();
        assert!(matches!(err, XbotError::MalformedCommand(_)));
    }

    #[test]
    fn test_split_body_without_argument() {
        assert_eq!(split_body("/debug"), ("/debug".to_string(), String::new()));
        assert_eq!(split_body(""), (String::new(), String::new()));
    }
}
