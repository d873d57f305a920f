use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

use crate::models::LeagueSeason;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub leagues: LeaguesConfig,
    pub monitoring: MonitoringConfig,
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub host: String,
    /// Timezone kick-off times are requested in, and in which "today" is computed.
    pub timezone: String,
    /// Status filter for fixture refreshes ("NS" = not started).
    pub fixture_status: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    pub timezone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaguesConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    #[serde(default = "default_json_logs")]
    pub json: bool,
}

fn default_json_logs() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub api_base_url: String,
    pub poll_timeout_seconds: u64,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub api_football_key: Option<SecretString>,
    pub telegram_bot_token: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            api_football_key: non_empty_env("API_FOOTBALL_KEY").map(SecretString::from),
            telegram_bot_token: non_empty_env("TELEGRAM_BOT_TOKEN").map(SecretString::from),
        }
    }

    pub fn require_api_football_key(&self) -> Result<SecretString> {
        match &self.api_football_key {
            Some(key) => Ok(key.clone()),
            None => bail!("API_FOOTBALL_KEY must be set"),
        }
    }

    pub fn require_telegram_bot_token(&self) -> Result<SecretString> {
        match &self.telegram_bot_token {
            Some(token) => Ok(token.clone()),
            None => bail!("TELEGRAM_BOT_TOKEN must be set"),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from config/default.toml, overlaying environment variables for secrets.
    pub fn load() -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let config_path = Path::new("config/default.toml");
        let mut config = Self::from_file(config_path)?;

        if let Some(path) = non_empty_env("DATABASE_PATH") {
            config.database.path = path;
        }
        config.validate()?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            bail!("database path must not be empty");
        }
        if self.scheduler.hour > 23 || self.scheduler.minute > 59 {
            bail!(
                "scheduler time {:02}:{:02} is not a valid time of day",
                self.scheduler.hour,
                self.scheduler.minute
            );
        }
        self.provider
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid provider timezone: {e}"))?;
        self.scheduler
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("invalid scheduler timezone: {e}"))?;
        Ok(())
    }
}

/// Read the configured (league, season) list. Re-read on every batch run.
pub fn load_leagues(path: &Path) -> Result<Vec<LeagueSeason>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read leagues file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse leagues file: {}", path.display()))
}
