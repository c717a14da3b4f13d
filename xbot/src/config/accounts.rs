//! Bot accounts: which bot ids this process serves and where their BotX host lives.

use anyhow::{Context, Result};
use uuid::Uuid;

/// Credentials of one bot on one BotX host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotAccount {
    pub id: Uuid,
    /// `cts.example.com`, or a full URL such as `http://localhost:8080`
    pub host: String,
    pub secret_key: String,
}

impl BotAccount {
    pub fn new(id: Uuid, host: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Base URL for API calls: the host itself when it carries a scheme, `https://<host>` otherwise.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}

/// Parses `BOT_CREDENTIALS`: comma-separated `host@secret_key@bot_id` entries (`|` is accepted as
/// the separator too).
pub fn parse_credentials(raw: &str) -> Result<Vec<BotAccount>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(entry: &str) -> Result<BotAccount> {
    let separator = if entry.contains('|') { '|' } else { '@' };
    // rsplitn keeps a host with `@` in it intact.
    let mut parts = entry.rsplitn(3, separator);
    let (Some(bot_id), Some(secret_key), Some(host)) = (parts.next(), parts.next(), parts.next())
    else {
        anyhow::bail!(
            "invalid bot credentials entry `{}`: expected host@secret_key@bot_id",
            entry
        );
    };

    let id = Uuid::parse_str(bot_id.trim())
        .with_context(|| format!("invalid bot id in credentials entry `{}`", entry))?;
    if host.trim().is_empty() || secret_key.trim().is_empty() {
        anyhow::bail!("empty host or secret key in credentials entry `{}`", entry);
    }

    Ok(BotAccount::new(id, host.trim(), secret_key.trim()))
}
