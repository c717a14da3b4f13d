//! # xbot-core
//!
//! Core types for the bot client: [`IncomingCommand`], [`SyncId`], [`MethodCallback`], status types,
//! the error taxonomy, and tracing initialization. Transport-agnostic; used by the `xbot` crate.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{HandlerError, MethodError, RemoteResponse, Result, XbotError};
pub use logger::{env_filter, init_tracing, DEFAULT_FILTER};
pub use types::{
    BotStatus, CallbackFailure, Chat, CommandType, IncomingCommand, MenuCommand, MethodCallback,
    Sender, StatusRecipient, StatusResult, SyncId,
};
