//! # xbot
//!
//! Client for the BotX bot platform: command dispatch to registered handlers and correlation of
//! asynchronous method callbacks with the outbound calls waiting for them.
//!
//! Core types and errors come from `xbot-core`; this crate wires the registry, dispatcher,
//! callback manager, and outbound methods into [`Bot`].

pub mod bot;
pub mod callbacks;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod observability;
pub mod registry;
pub mod responses;
pub mod runner;

pub use xbot_core::{
    env_filter, init_tracing, BotStatus, CallbackFailure, Chat, CommandType, HandlerError, IncomingCommand,
    MenuCommand, MethodCallback, MethodError, RemoteResponse, Result, Sender, StatusRecipient,
    StatusResult, SyncId, XbotError,
};

pub use bot::Bot;
pub use callbacks::{
    callback_error, CallbackErrorFn, CallbackHandle, CallbackManager, CallbackResult,
    CallbackStats, ErrorCallbackHandlers, ResolveOutcome,
};
pub use client::{
    BotXMethod, ChatKind, CreateChat, HttpRequest, HttpResponse, MethodExecutor, MethodOutcome,
    ReqwestTransport, StatusHandlers, StickerPack, SyncIdResult, Transport,
};
pub use config::{BaseConfig, BotAccount, BotConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use observability::{BotEvent, EventSink, TracingSink};
pub use registry::{HandlerEntry, HandlerKind, HandlerRegistry, Visibility};
pub use responses::{build_bot_disabled_response, build_command_accepted_response};
pub use runner::{init_from_env, init_with_config};
