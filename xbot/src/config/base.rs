//! Base config: logging and BotX timeouts. Loaded from env.

use anyhow::Result;
use std::env;
use std::time::Duration;

const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Base config shared by every bot account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseConfig {
    /// Log file path
    pub log_file: String,
    /// BOTX_CALLBACK_TIMEOUT_SECS; `None` waits until the callback arrives or the bot stops
    pub callback_timeout: Option<Duration>,
    /// BOTX_HTTP_TIMEOUT_SECS
    pub http_timeout: Duration,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            log_file: "logs/xbot.log".to_string(),
            callback_timeout: Some(Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS)),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl BaseConfig {
    /// Load from environment variables, falling back to defaults for unset ones.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let log_file = env::var("LOG_FILE").unwrap_or(defaults.log_file);

        let callback_timeout = match env::var("BOTX_CALLBACK_TIMEOUT_SECS") {
            Ok(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Ok(raw) => Some(Duration::from_secs(parse_secs(
                "BOTX_CALLBACK_TIMEOUT_SECS",
                &raw,
            )?)),
            Err(_) => defaults.callback_timeout,
        };

        let http_timeout = match env::var("BOTX_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(parse_secs("BOTX_HTTP_TIMEOUT_SECS", &raw)?),
            Err(_) => defaults.http_timeout,
        };

        Ok(Self {
            log_file,
            callback_timeout,
            http_timeout,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_file.trim().is_empty() {
            anyhow::bail!("LOG_FILE is set but empty");
        }
        if self.http_timeout.is_zero() {
            anyhow::bail!("BOTX_HTTP_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} is not a number of seconds: {}", name, raw))
}
