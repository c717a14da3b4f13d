//! Sender of an inbound command.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identity and chat role of the command sender. Every field is optional in system events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub huid: Option<Uuid>,
    pub username: Option<String>,
    pub ad_login: Option<String>,
    pub ad_domain: Option<String>,
    pub is_chat_admin: Option<bool>,
    pub is_chat_creator: Option<bool>,
    pub locale: Option<String>,
}
