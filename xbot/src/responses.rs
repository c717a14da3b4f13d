//! JSON bodies the webhook glue answers BotX with.

use serde_json::{json, Value};

/// Body for an accepted command (HTTP 202).
pub fn build_command_accepted_response() -> Value {
    json!({"result": "accepted"})
}

/// Body for a command the bot refuses to process (HTTP 503).
pub fn build_bot_disabled_response(status_message: &str) -> Value {
    json!({
        "error_data": {"status_message": status_message},
        "errors": [],
        "reason": "bot_disabled",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_response() {
        assert_eq!(build_command_accepted_response(), json!({"result": "accepted"}));
    }

    #[test]
    fn test_bot_disabled_response() {
        let body = build_bot_disabled_response("Bot is disabled for maintenance");
        assert_eq!(
            body,
            json!({
                "error_data": {"status_message": "Bot is disabled for maintenance"},
                "errors": [],
                "reason": "bot_disabled",
            })
        );
    }
}
