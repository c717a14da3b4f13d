//! Startup: load config from env, init logging, and build the bot.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};
use xbot_core::init_tracing;

use crate::bot::Bot;
use crate::config::BotConfig;
use crate::registry::HandlerRegistry;

/// Loads and validates [`BotConfig`] from env, initializes tracing, and builds a started [`Bot`]
/// with the HTTP transport.
#[instrument(skip(registry))]
pub fn init_from_env(registry: HandlerRegistry) -> Result<Bot> {
    let config = BotConfig::load()?;
    init_with_config(config, registry)
}

/// Same as [`init_from_env`] with an already loaded config.
#[instrument(skip(config, registry))]
pub fn init_with_config(config: BotConfig, registry: HandlerRegistry) -> Result<Bot> {
    config.validate()?;

    if let Some(dir) = Path::new(config.log_file()).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        }
    }
    init_tracing(config.log_file())?;

    info!(
        accounts = config.accounts().len(),
        handlers = registry.len(),
        callback_timeout_secs = config.base().callback_timeout.map(|t| t.as_secs()),
        "Initializing bot"
    );

    let bot = Bot::from_config(config, registry)?;
    bot.start();
    Ok(bot)
}
