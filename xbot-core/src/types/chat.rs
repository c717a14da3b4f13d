//! Chat the inbound command was sent from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat identity: group chat id (absent for some system events), chat type and the CTS host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Option<Uuid>,
    pub chat_type: String,
    pub host: String,
}
