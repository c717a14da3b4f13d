//! End-to-end callback correlation over HTTP: a mockito server plays BotX, callbacks are fed
//! through [`xbot::Bot::on_callback`].
//!
//! Covers: successful callback, unmapped and mapped error reasons, zero timeout followed by an
//! orphan callback, shutdown while waiting, not waiting, and handlers answering through the API.

use std::collections::HashMap;
use std::time::Duration;

use mockito::Matcher;
use serde::Serialize;
use serde_json::json;
use xbot::{
    callback_error, Bot, BotXMethod, ChatKind, CreateChat, ErrorCallbackHandlers, HandlerRegistry,
    IncomingCommand, MethodError, ResolveOutcome, SyncId, SyncIdResult, XbotError,
};

use fixtures::{
    bot_id, chat_id, error_callback, http_bot, init_tracing, ok_callback, sync_id, wait_until,
    CHAT_ID, SYNC_ID,
};

/// Callback-bearing test method with one mapped error reason.
#[derive(Serialize)]
struct FooBar {
    baz: u32,
}

impl BotXMethod for FooBar {
    type Result = SyncIdResult;
    const NAME: &'static str = "foo_bar";

    fn path(&self) -> String {
        "/foo/bar".to_string()
    }

    fn callback_handlers(&self) -> ErrorCallbackHandlers {
        let mut handlers: ErrorCallbackHandlers = HashMap::new();
        handlers.insert(
            "foo_bar_error".to_string(),
            callback_error("FooBarError", "FooBar comment"),
        );
        handlers
    }

    fn callback_sync_id(&self, result: &SyncIdResult) -> Option<SyncId> {
        Some(result.sync_id)
    }
}

async fn foo_bar_server() -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/foo/bar")
        .match_body(Matcher::Json(json!({"baz": 1})))
        .with_status(202)
        .with_header("content-type", "application/json")
        .with_body(json!({"status": "ok", "result": {"sync_id": SYNC_ID}}).to_string())
        .create_async()
        .await;
    (server, mock)
}

/// **Test: A successful callback resumes the waiting call with its result.**
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_ok_returns_result() {
    init_tracing();
    let (server, mock) = foo_bar_server().await;
    let (bot, sink) = http_bot(&server.url(), HandlerRegistry::new());

    let task = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.call(bot_id(), &FooBar { baz: 1 }, true, None).await })
    };
    wait_until(|| bot.callbacks().is_pending(&sync_id())).await;

    let outcome = bot
        .on_callback(ok_callback(SYNC_ID, json!({"answer": 42})))
        .unwrap();
    assert_eq!(outcome, ResolveOutcome::Delivered);

    let result = task.await.unwrap().unwrap();
    assert_eq!(result.result.sync_id, sync_id());
    assert_eq!(result.callback, Some(json!({"answer": 42})));
    mock.assert_async().await;
    assert!(sink.orphans().is_empty());
    bot.stop().await;
}

/// **Test: An error callback with an unmapped reason fails the call generically.**
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_unmapped_error() {
    let (server, _mock) = foo_bar_server().await;
    let (bot, _sink) = http_bot(&server.url(), HandlerRegistry::new());

    let task = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.call(bot_id(), &FooBar { baz: 1 }, true, None).await })
    };
    wait_until(|| bot.callbacks().is_pending(&sync_id())).await;
    bot.on_callback(error_callback(SYNC_ID, "quux_error")).unwrap();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        XbotError::Method(MethodError::CallbackFailed(ref failure)) if failure.reason == "quux_error"
    ));
    assert!(err.to_string().contains("failed with"));
    bot.stop().await;
}

/// **Test: An error callback with a mapped reason raises the method's error.**
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_callback_mapped_error() {
    let (server, _mock) = foo_bar_server().await;
    let (bot, _sink) = http_bot(&server.url(), HandlerRegistry::new());

    let task = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.call(bot_id(), &FooBar { baz: 1 }, true, None).await })
    };
    wait_until(|| bot.callbacks().is_pending(&sync_id())).await;
    bot.on_callback(error_callback(SYNC_ID, "foo_bar_error"))
        .unwrap();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        XbotError::Method(MethodError::CallbackRejected { .. })
    ));
    assert!(err.to_string().contains("FooBar comment"));
    bot.stop().await;
}

/// **Test: Zero timeout fails at once; the late callback is an orphan, not an error.**
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_timeout_then_orphan_callback() {
    let (server, _mock) = foo_bar_server().await;
    let (bot, sink) = http_bot(&server.url(), HandlerRegistry::new());

    let err = bot
        .call(bot_id(), &FooBar { baz: 1 }, true, Some(Duration::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        XbotError::Method(MethodError::CallbackNotReceived { .. })
    ));
    assert!(err.to_string().contains("hasn't been received"));

    let outcome = bot.on_callback(ok_callback(SYNC_ID, json!({}))).unwrap();
    assert_eq!(outcome, ResolveOutcome::Orphaned);
    assert_eq!(sink.orphans(), vec![sync_id()]);
    bot.stop().await;
}

/// **Test: Stopping the bot cancels a waiting call with a shutting-down error.**
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_cancels_waiting_call() {
    let (server, _mock) = foo_bar_server().await;
    let (bot, _sink) = http_bot(&server.url(), HandlerRegistry::new());

    let task = {
        let bot = bot.clone();
        tokio::spawn(async move { bot.call(bot_id(), &FooBar { baz: 1 }, true, None).await })
    };
    wait_until(|| bot.callbacks().is_pending(&sync_id())).await;
    bot.stop().await;

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        XbotError::Method(MethodError::ShuttingDown { sync_id: id }) if id == sync_id()
    ));
    assert!(err.to_string().contains(SYNC_ID));
    assert_eq!(bot.callbacks().pending_count(), 0);
}

/// **Test: Not waiting returns right after the response; the callback is an orphan.**
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dont_wait_for_callback() {
    let (server, _mock) = foo_bar_server().await;
    let (bot, sink) = http_bot(&server.url(), HandlerRegistry::new());

    let outcome = bot
        .call(bot_id(), &FooBar { baz: 1 }, false, None)
        .await
        .unwrap();
    assert!(outcome.callback.is_none());
    assert_eq!(bot.callbacks().pending_count(), 0);

    bot.on_callback(ok_callback(SYNC_ID, json!({}))).unwrap();
    assert_eq!(sink.orphans(), vec![sync_id()]);
    bot.stop().await;
}

/// **Test: Malformed callbacks are rejected.**
#[tokio::test]
async fn test_malformed_callback() {
    let (bot, _sink) = http_bot("http://127.0.0.1:1", HandlerRegistry::new());

    let err = bot
        .on_callback(json!({"status": "maybe", "sync_id": SYNC_ID}))
        .unwrap_err();
    assert!(matches!(err, XbotError::MalformedCallback(_)));
    bot.stop().await;
}

async fn echo(cmd: IncomingCommand, bot: Bot) -> anyhow::Result<()> {
    bot.answer_message(&cmd, cmd.argument.clone()).await?;
    Ok(())
}

/// **Test: A handler answers through the notifications API and waits for delivery.**
///
/// **Setup:** `/echo` answers with its argument; BotX accepts the notification with a sync id.
/// **Action:** Ingest `/echo hi`, feed the delivery callback, stop.
/// **Expected:** Notification body matches; no handler failures.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_answer_waits_for_delivery() {
    let mut server = mockito::Server::new_async().await;
    let notification = server
        .mock("POST", "/api/v4/botx/notifications/direct")
        .match_body(Matcher::PartialJson(json!({
            "group_chat_id": CHAT_ID,
            "notification": {"status": "ok", "body": "hi"},
        })))
        .with_status(202)
        .with_body(json!({"status": "ok", "result": {"sync_id": SYNC_ID}}).to_string())
        .create_async()
        .await;

    let mut registry = HandlerRegistry::new();
    registry
        .command("/echo", "Echo", echo)
        .unwrap();
    let (bot, sink) = http_bot(&server.url(), registry);

    bot.on_command(fixtures::command_payload("/echo hi")).unwrap();
    wait_until(|| bot.callbacks().is_pending(&sync_id())).await;
    bot.on_callback(ok_callback(SYNC_ID, json!({}))).unwrap();
    bot.stop().await;

    notification.assert_async().await;
    assert!(sink.handler_failures().is_empty());
}

/// **Test: Chat and sticker methods map status codes and results.**
#[tokio::test]
async fn test_chat_and_sticker_methods() {
    let mut server = mockito::Server::new_async().await;
    let _create = server
        .mock("POST", "/api/v3/botx/chats/create")
        .with_status(403)
        .with_body(json!({"status": "error", "reason": "chat_creation_is_prohibited"}).to_string())
        .create_async()
        .await;
    let _add = server
        .mock("POST", "/api/v3/botx/chats/add_user")
        .with_status(200)
        .with_body(json!({"status": "ok", "result": true}).to_string())
        .create_async()
        .await;
    let _unpin = server
        .mock("POST", "/api/v3/botx/chats/unpin_message")
        .with_status(404)
        .with_body(json!({"status": "error", "reason": "chat_not_found"}).to_string())
        .create_async()
        .await;
    let _sticker = server
        .mock("POST", "/api/v3/botx/stickers/packs")
        .match_body(Matcher::Json(json!({"name": "Test sticker pack"})))
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "result": {
                    "id": "26080153-a57d-5a8c-af0e-fdaa16c3f3ed",
                    "name": "Test sticker pack",
                    "public": false,
                },
            })
            .to_string(),
        )
        .create_async()
        .await;
    let (bot, _sink) = http_bot(&server.url(), HandlerRegistry::new());

    let err = bot
        .create_chat(bot_id(), CreateChat::new("Test", ChatKind::Chat, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        XbotError::Method(MethodError::ChatCreationProhibited(ref r)) if r.status == 403
    ));

    bot.add_users_to_chat(bot_id(), chat_id(), vec![uuid::Uuid::new_v4()])
        .await
        .unwrap();

    let err = bot.unpin_message(bot_id(), chat_id()).await.unwrap_err();
    assert!(matches!(err, XbotError::Method(MethodError::ChatNotFound(_))));

    let pack = bot
        .create_sticker_pack(bot_id(), "Test sticker pack")
        .await
        .unwrap();
    assert_eq!(pack.name, "Test sticker pack");
    assert!(!pack.is_public);
    bot.stop().await;
}
