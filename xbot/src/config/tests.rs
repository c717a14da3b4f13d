//! Config tests.

use crate::config::{parse_credentials, BaseConfig, BotAccount, BotConfig};
use serial_test::serial;
use std::env;
use std::time::Duration;
use uuid::Uuid;

const BOT_ID: &str = "24348246-6791-4ac0-9d86-b948cd6a0e46";

fn clear_env() {
    env::remove_var("BOT_CREDENTIALS");
    env::remove_var("LOG_FILE");
    env::remove_var("BOTX_CALLBACK_TIMEOUT_SECS");
    env::remove_var("BOTX_HTTP_TIMEOUT_SECS");
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();
    env::set_var("BOT_CREDENTIALS", format!("cts.example.com@secret@{}", BOT_ID));

    let config = BotConfig::load().unwrap();

    assert_eq!(config.log_file(), "logs/xbot.log");
    assert_eq!(config.base().callback_timeout, Some(Duration::from_secs(30)));
    assert_eq!(config.base().http_timeout, Duration::from_secs(60));
    assert_eq!(config.accounts().len(), 1);
    assert_eq!(config.accounts()[0].host, "cts.example.com");
    assert_eq!(config.accounts()[0].secret_key, "secret");
    assert_eq!(config.accounts()[0].id, Uuid::parse_str(BOT_ID).unwrap());
    assert!(config.validate().is_ok());
    clear_env();
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("BOT_CREDENTIALS", format!("cts.example.com@secret@{}", BOT_ID));
    env::set_var("LOG_FILE", "custom.log");
    env::set_var("BOTX_CALLBACK_TIMEOUT_SECS", "5");
    env::set_var("BOTX_HTTP_TIMEOUT_SECS", "10");

    let config = BotConfig::load().unwrap();

    assert_eq!(config.log_file(), "custom.log");
    assert_eq!(config.base().callback_timeout, Some(Duration::from_secs(5)));
    assert_eq!(config.base().http_timeout, Duration::from_secs(10));
    clear_env();
}

#[test]
#[serial]
fn test_callback_timeout_none_waits_indefinitely() {
    clear_env();
    env::set_var("BOTX_CALLBACK_TIMEOUT_SECS", "none");

    let base = BaseConfig::load().unwrap();

    assert_eq!(base.callback_timeout, None);
    clear_env();
}

#[test]
#[serial]
fn test_invalid_timeout_is_rejected() {
    clear_env();
    env::set_var("BOTX_HTTP_TIMEOUT_SECS", "soon");

    assert!(BaseConfig::load().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_missing_credentials_is_an_error() {
    clear_env();
    let err = BotConfig::load().unwrap_err();
    assert!(err.to_string().contains("BOT_CREDENTIALS"));
}

#[test]
fn test_parse_credentials_multiple_entries_and_separators() {
    let other = "5a9a5a3e-0b16-4a3b-9b24-6b1c2e7c8f10";
    let raw = format!(
        "cts.example.com@secret@{}, http://localhost:8080|key|{}",
        BOT_ID, other
    );

    let accounts = parse_credentials(&raw).unwrap();

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].base_url(), "https://cts.example.com");
    assert_eq!(accounts[1].host, "http://localhost:8080");
    assert_eq!(accounts[1].secret_key, "key");
    assert_eq!(accounts[1].base_url(), "http://localhost:8080");
}

#[test]
fn test_parse_credentials_rejects_bad_entries() {
    assert!(parse_credentials("cts.example.com@secret").is_err());
    assert!(parse_credentials("cts.example.com@secret@not-a-uuid").is_err());
    assert!(parse_credentials(&format!("@secret@{}", BOT_ID)).is_err());
    assert!(parse_credentials("").unwrap().is_empty());
}

#[test]
fn test_validate_rejects_duplicates_and_empty() {
    let id = Uuid::parse_str(BOT_ID).unwrap();
    assert!(BotConfig::new(vec![]).validate().is_err());

    let duplicated = BotConfig::new(vec![
        BotAccount::new(id, "cts.example.com", "a"),
        BotAccount::new(id, "other.example.com", "b"),
    ]);
    let err = duplicated.validate().unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn test_base_url_strips_trailing_slash() {
    let account = BotAccount::new(Uuid::nil(), "https://cts.example.com/", "s");
    assert_eq!(account.base_url(), "https://cts.example.com");
}
