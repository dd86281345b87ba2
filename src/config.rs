use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub season: SeasonConfig,
    pub data: DataConfig,
    pub monitoring: MonitoringConfig,
    pub batch: BatchConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonConfig {
    /// The season currently being played. Matches of earlier seasons are
    /// always in the past; only this season's schedule can contain future
    /// matches.
    pub current: u32,
    /// First day of the current season (a Friday).
    pub start_date: NaiveDate,
    /// Total number of weeks in a season.
    pub weeks: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub teams_dir: String,
    pub players_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Re-authenticate after this many upstream queries.
    pub reauth_query_limit: u32,
    /// Politeness cap for the batch binaries.
    pub requests_per_second: u32,
}

/// A user allowed to log in to this dashboard. Each user owns one team in
/// the game; the default analysis mode targets that team's next opponent.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub login: String,
    pub main_team_id: String,
    pub active: bool,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    /// Upstream login for the batch binaries.
    pub upstream_login: Option<String>,
    /// Upstream read-only access code for the batch binaries.
    pub upstream_code: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            upstream_login: std::env::var("UPSTREAM_LOGIN").ok(),
            upstream_code: std::env::var("UPSTREAM_CODE").ok().map(SecretString::from),
        }
    }
}

impl AppConfig {
    /// Load configuration from config/default.toml, overlaying environment
    /// variables for secrets.
    pub fn load() -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let config_path = Path::new("config/default.toml");
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig =
            toml::from_str(&contents).context("Failed to parse config/default.toml")?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }

    /// Look up an active user by login name.
    pub fn active_user(&self, login: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.login == login && u.active)
    }
}
