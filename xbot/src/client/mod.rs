//! Outbound BotX API: transport seam, method trait, executor, and the concrete methods.

mod chats;
mod executor;
mod method;
mod notifications;
mod stickers;
pub mod transport;

pub use chats::{AddUsers, ChatIdResult, ChatKind, CreateChat, UnpinMessage};
pub use executor::MethodExecutor;
pub use method::{default_status_handlers, BotXMethod, MethodOutcome, StatusHandlers, SyncIdResult};
pub use notifications::{NotificationPayload, SendDirectNotification};
pub use stickers::{CreateStickerPack, StickerPack};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
