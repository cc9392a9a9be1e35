//! wumtodo configuration loader.
//!
//! One TOML file plus environment overrides for secrets. The loaded struct is
//! built once at startup and handed to every component by reference; nothing
//! reads the environment after this point.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_CONFIG_PATH: &str = "wumtodo.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WumtodoConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_http_max_in_flight")]
    pub http_max_in_flight: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_http_timeout_seconds() -> u64 {
    30
}

fn default_http_max_in_flight() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            http_timeout_seconds: default_http_timeout_seconds(),
            http_max_in_flight: default_http_max_in_flight(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Hex-encoded Ed25519 application public key used to authenticate
    /// inbound interaction webhooks.
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(default)]
    pub bot_token: String,
    /// Base URL of the companion web UI, linked from notifications.
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

fn default_site_url() -> String {
    "https://wumtodo.pages.dev".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            application_id: String::new(),
            bot_token: String::new(),
            site_url: default_site_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    "wumtodo.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_reminder_enabled")]
    pub enabled: bool,
    /// cron expression (seconds-resolution, UTC). Default: daily at 09:00.
    #[serde(default = "default_reminder_schedule")]
    pub schedule: String,
}

fn default_reminder_enabled() -> bool {
    true
}

fn default_reminder_schedule() -> String {
    "0 0 9 * * *".to_string()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: default_reminder_enabled(),
            schedule: default_reminder_schedule(),
        }
    }
}

impl WumtodoConfig {
    /// Load from `path` (default `wumtodo.toml`, which may be absent), then
    /// apply environment overrides for the Discord secrets.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        // Pull a local .env into the process environment first, if present.
        dotenvy::dotenv().ok();

        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = Self::read_file(&path)?;

        if let Ok(value) = std::env::var("WUMTODO_DISCORD_PUBLIC_KEY") {
            cfg.discord.public_key = value;
        }
        if let Ok(value) = std::env::var("WUMTODO_DISCORD_APPLICATION_ID") {
            cfg.discord.application_id = value;
        }
        if let Ok(value) = std::env::var("WUMTODO_DISCORD_BOT_TOKEN") {
            cfg.discord.bot_token = value;
        }
        if let Ok(value) = std::env::var("WUMTODO_DATABASE_PATH") {
            cfg.database.path = value;
        }

        Ok(cfg)
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Startup validation: the webhook path cannot run without the Discord
    /// credentials, and a bad cron expression should fail fast.
    pub fn validate(&self) -> Result<()> {
        if self.discord.public_key.trim().is_empty() {
            anyhow::bail!("discord.public_key (or WUMTODO_DISCORD_PUBLIC_KEY) is required");
        }
        if self.discord.application_id.trim().is_empty() {
            anyhow::bail!("discord.application_id (or WUMTODO_DISCORD_APPLICATION_ID) is required");
        }
        if self.discord.bot_token.trim().is_empty() {
            anyhow::bail!("discord.bot_token (or WUMTODO_DISCORD_BOT_TOKEN) is required");
        }
        if self.reminder.enabled {
            cron::Schedule::from_str(&self.reminder.schedule).with_context(|| {
                format!("invalid reminder.schedule {:?}", self.reminder.schedule)
            })?;
        }
        Ok(())
    }
}
