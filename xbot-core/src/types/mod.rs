//! Core types: inbound command, sender, chat, status, method callback, sync id.
//!
//! One file per main type, mirroring the payload sections of the BotX protocol.

mod callback;
mod chat;
mod command;
mod status;
mod sync_id;
mod user;

pub use callback::{CallbackFailure, MethodCallback};
pub use chat::Chat;
pub use command::{CommandType, IncomingCommand};
pub use status::{BotStatus, MenuCommand, StatusRecipient, StatusResult};
pub use sync_id::SyncId;
pub use user::Sender;
