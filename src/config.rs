//! Process configuration
//!
//! Loaded once at startup from `config.toml` in the working directory and
//! validated eagerly: a missing or ill-typed field aborts the process before
//! the gateway connection is opened. Nothing after startup reads the file
//! again.

use anyhow::{bail, Context, Result};
use figment::providers::{Format, Toml};
use figment::Figment;
use serde::Deserialize;

/// Top-level bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Discord bot credential.
    pub bot_token: String,
    /// Discord application id the slash commands are registered under.
    pub application_id: u64,
    /// Guild the commands are scoped to.
    pub guild_id: u64,
    pub log: LogConfig,
    pub api: ApiConfig,
}

/// Logging sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log file path.
    pub path: String,
    /// Whether terminal output is colorized.
    pub colorize: bool,
    /// Channel that receives audit posts for link/unlink mutations.
    pub verify_channel: u64,
}

/// Account registry endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Registry base URL, e.g. `https://api.example.com`.
    pub url: String,
    /// Static bearer credential attached to every request.
    pub token: String,
}

impl Config {
    /// Loads and validates configuration from `path`.
    pub fn load(path: &str) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .with_context(|| format!("failed to load configuration from {path}"))?;

        config.validate()?;
        Ok(config)
    }

    // Serde already guarantees presence and types; this catches fields that
    // are present but empty, which would otherwise fail much later with an
    // opaque gateway or HTTP error.
    fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            bail!("config: bot_token must not be empty");
        }
        if self.application_id == 0 {
            bail!("config: application_id must not be zero");
        }
        if self.guild_id == 0 {
            bail!("config: guild_id must not be zero");
        }
        if self.log.path.is_empty() {
            bail!("config: log.path must not be empty");
        }
        if self.log.verify_channel == 0 {
            bail!("config: log.verify_channel must not be zero");
        }
        if self.api.url.is_empty() {
            bail!("config: api.url must not be empty");
        }
        if self.api.token.is_empty() {
            bail!("config: api.token must not be empty");
        }
        Ok(())
    }
}
