//! Sticker pack methods.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::method::BotXMethod;

/// `POST /api/v3/botx/stickers/packs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateStickerPack {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StickerPack {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "public")]
    pub is_public: bool,
}

impl BotXMethod for CreateStickerPack {
    type Result = StickerPack;
    const NAME: &'static str = "create_sticker_pack";

    fn path(&self) -> String {
        "/api/v3/botx/stickers/packs".to_string()
    }
}
