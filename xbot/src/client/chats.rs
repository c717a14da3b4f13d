//! Chat management methods.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use xbot_core::MethodError;

use super::method::{default_status_handlers, BotXMethod, StatusHandlers};

/// Chat type as the API spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Chat,
    GroupChat,
    Channel,
}

/// `POST /api/v3/botx/chats/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateChat {
    pub name: String,
    pub description: Option<String>,
    pub chat_type: ChatKind,
    pub members: Vec<Uuid>,
    pub shared_history: bool,
}

impl CreateChat {
    pub fn new(name: impl Into<String>, chat_type: ChatKind, members: Vec<Uuid>) -> Self {
        Self {
            name: name.into(),
            description: None,
            chat_type,
            members,
            shared_history: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_shared_history(mut self, shared_history: bool) -> Self {
        self.shared_history = shared_history;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChatIdResult {
    pub chat_id: Uuid,
}

impl BotXMethod for CreateChat {
    type Result = ChatIdResult;
    const NAME: &'static str = "create_chat";

    fn path(&self) -> String {
        "/api/v3/botx/chats/create".to_string()
    }

    fn status_handlers(&self) -> StatusHandlers {
        let mut handlers = default_status_handlers();
        handlers.insert(403, MethodError::ChatCreationProhibited);
        handlers.insert(422, MethodError::ChatCreation);
        handlers
    }
}

/// `POST /api/v3/botx/chats/add_user`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddUsers {
    pub group_chat_id: Uuid,
    pub user_huids: Vec<Uuid>,
}

impl BotXMethod for AddUsers {
    /// Always `true`.
    type Result = bool;
    const NAME: &'static str = "add_user";

    fn path(&self) -> String {
        "/api/v3/botx/chats/add_user".to_string()
    }

    fn status_handlers(&self) -> StatusHandlers {
        let mut handlers = default_status_handlers();
        handlers.insert(403, MethodError::PermissionDenied);
        handlers
    }
}

/// `POST /api/v3/botx/chats/unpin_message`. The response carries only `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnpinMessage {
    pub chat_id: Uuid,
}

impl BotXMethod for UnpinMessage {
    type Result = Option<Value>;
    const NAME: &'static str = "unpin_message";

    fn path(&self) -> String {
        "/api/v3/botx/chats/unpin_message".to_string()
    }

    fn status_handlers(&self) -> StatusHandlers {
        let mut handlers = default_status_handlers();
        handlers.insert(403, MethodError::PermissionDenied);
        handlers.insert(404, MethodError::ChatNotFound);
        handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_chat_body() {
        let member = Uuid::parse_str("f16cdc5f-6366-5552-9ecd-c36290ab3d11").unwrap();
        let method = CreateChat::new("Test chat name", ChatKind::Chat, vec![member])
            .with_description("Test description");

        assert_eq!(
            method.body().unwrap(),
            Some(json!({
                "name": "Test chat name",
                "description": "Test description",
                "chat_type": "chat",
                "members": ["f16cdc5f-6366-5552-9ecd-c36290ab3d11"],
                "shared_history": false,
            }))
        );
    }

    #[test]
    fn test_status_handlers_per_method() {
        let create = CreateChat::new("x", ChatKind::GroupChat, vec![]).status_handlers();
        assert!(create.contains_key(&401));
        assert!(create.contains_key(&403));
        assert!(create.contains_key(&422));

        let unpin = UnpinMessage { chat_id: Uuid::nil() }.status_handlers();
        assert!(unpin.contains_key(&404));
        assert!(!unpin.contains_key(&422));
    }

    #[test]
    fn test_chat_kind_wire_names() {
        assert_eq!(json!(ChatKind::GroupChat), json!("group_chat"));
        assert_eq!(json!(ChatKind::Channel), json!("channel"));
    }
}
