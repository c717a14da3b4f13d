//! Bot configuration: BaseConfig (logging + timeouts) + bot accounts. Loaded from env.

mod accounts;
mod base;
mod bot_config;

#[cfg(test)]
mod tests;

pub use accounts::{parse_credentials, BotAccount};
pub use base::BaseConfig;
pub use bot_config::BotConfig;
