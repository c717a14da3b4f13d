//! Status request recipient and the status listing (bot menu) returned for it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, XbotError};

/// Who asks for the status listing. Parsed from the status request query parameters; visibility
/// predicates receive it to decide which commands to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecipient {
    pub bot_id: Uuid,
    pub huid: Option<Uuid>,
    pub ad_login: Option<String>,
    pub ad_domain: Option<String>,
    pub is_admin: Option<bool>,
    pub chat_type: Option<String>,
}

impl StatusRecipient {
    /// Builds the recipient from query parameters (`bot_id`, `user_huid`, `ad_login`, `ad_domain`,
    /// `is_admin`, `chat_type`). Only `bot_id` is required.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self> {
        let bot_id = params
            .get("bot_id")
            .ok_or_else(|| XbotError::MalformedStatusRequest("missing bot_id".to_string()))
            .and_then(|raw| parse_uuid("bot_id", raw))?;
        let huid = params
            .get("user_huid")
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_uuid("user_huid", raw))
            .transpose()?;
        let is_admin = params
            .get("is_admin")
            .map(|raw| {
                raw.parse::<bool>().map_err(|_| {
                    XbotError::MalformedStatusRequest(format!("is_admin is not a bool: {}", raw))
                })
            })
            .transpose()?;

        Ok(Self {
            bot_id,
            huid,
            ad_login: non_empty(params.get("ad_login")),
            ad_domain: non_empty(params.get("ad_domain")),
            is_admin,
            chat_type: non_empty(params.get("chat_type")),
        })
    }
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| XbotError::MalformedStatusRequest(format!("{} is not a UUID: {}", field, e)))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// One visible command in the bot menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCommand {
    pub body: String,
    pub name: String,
    pub description: String,
}

impl MenuCommand {
    /// `body` is the command key the client sends back, `name` the handler name.
    pub fn new(body: &str, name: &str, description: &str) -> Self {
        Self {
            body: body.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    pub commands: Vec<MenuCommand>,
    pub enabled: bool,
    pub status_message: String,
}

/// Status response body: `{"status": "ok", "result": {"commands": [...], "enabled": true, ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStatus {
    pub status: String,
    pub result: StatusResult,
}

impl BotStatus {
    pub fn new(commands: Vec<MenuCommand>) -> Self {
        Self {
            status: "ok".to_string(),
            result: StatusResult {
                commands,
                enabled: true,
                status_message: "Bot is working".to_string(),
            },
        }
    }
}
