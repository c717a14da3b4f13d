//! BotConfig: BaseConfig + bot accounts. Use load() for env-based loading.

use std::collections::HashSet;

use anyhow::Result;

use super::{parse_credentials, BaseConfig, BotAccount};

/// Bot config. Use BotConfig::load() for env-based loading.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub base: BaseConfig,
    pub accounts: Vec<BotAccount>,
}

impl BotConfig {
    /// Config with default base settings, for bots built in code.
    pub fn new(accounts: Vec<BotAccount>) -> Self {
        Self {
            base: BaseConfig::default(),
            accounts,
        }
    }

    /// Load full config from `.env` and environment variables. `BOT_CREDENTIALS` is required.
    /// Call validate() after load to check config before init.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let base = BaseConfig::load()?;
        let raw = std::env::var("BOT_CREDENTIALS")
            .map_err(|_| anyhow::anyhow!("BOT_CREDENTIALS not set"))?;
        let accounts = parse_credentials(&raw)?;
        Ok(Self { base, accounts })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if self.accounts.is_empty() {
            anyhow::bail!("no bot accounts configured");
        }
        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !seen.insert(account.id) {
                anyhow::bail!("bot {} is configured more than once", account.id);
            }
            if reqwest::Url::parse(&account.base_url()).is_err() {
                anyhow::bail!(
                    "host of bot {} is not a valid URL: {}",
                    account.id,
                    account.host
                );
            }
        }
        Ok(())
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn accounts(&self) -> &[BotAccount] {
        &self.accounts
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
}
