use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::app_dirs::AppDirs;

/// Longest access token lifetime accepted from configuration (one year)
pub const MAX_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24 * 365;

/// Runtime settings for the server and the CLI.
///
/// Loaded once at startup and handed to whoever needs it; nothing below the
/// entry points reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub access_token_expire_minutes: i64,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database_path: None,
            google_client_id: None,
            google_client_secret: None,
            access_token_expire_minutes: 30,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl Config {
    /// Apply environment overrides on top of the loaded values
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::with_env_overrides`] with an injectable lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = parse_var(&lookup, "SKOLA_PORT") {
            self.port = port;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(id) = lookup("GOOGLE_CLIENT_ID") {
            self.google_client_id = Some(id);
        }
        if let Some(secret) = lookup("GOOGLE_CLIENT_SECRET") {
            self.google_client_secret = Some(secret);
        }
        if let Some(minutes) = parse_var(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.access_token_expire_minutes = minutes;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        self.validated()
    }

    /// Clamp values that would otherwise overflow downstream
    pub fn validated(mut self) -> Self {
        let minutes = self.access_token_expire_minutes;
        let clamped = minutes.clamp(1, MAX_TOKEN_EXPIRE_MINUTES);
        if clamped != minutes {
            warn!("access_token_expire_minutes {minutes} out of range, using {clamped}");
            self.access_token_expire_minutes = clamped;
        }
        self
    }

    /// Access token lifetime, always within `1..=MAX_TOKEN_EXPIRE_MINUTES` minutes
    pub fn token_ttl(&self) -> Duration {
        Duration::minutes(
            self.access_token_expire_minutes
                .clamp(1, MAX_TOKEN_EXPIRE_MINUTES),
        )
    }

    /// Both OAuth credentials, if configured
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        match (&self.google_client_id, &self.google_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => {
            info!("{key} set from environment");
            Some(value)
        }
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, keeping configured value");
            None
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("skola_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg.validated(),
                Err(e) => warn!("Ignoring unreadable config {}: {e}", self.path.display()),
            },
            Err(_) => info!("No config at {}, using defaults", self.path.display()),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
