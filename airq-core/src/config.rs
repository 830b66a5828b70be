use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_STATION_LIMIT: u32 = 200;
pub const DEFAULT_HORIZON: u32 = 24;
/// Largest horizon the backend accepts.
pub const MAX_HORIZON: u32 = 168;

pub const ENV_BASE_URL: &str = "AIRQ_API_BASE_URL";
pub const ENV_REFRESH_TOKEN: &str = "AIRQ_REFRESH_TOKEN";

/// Where and how to reach the prediction backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub station_limit: u32,
    pub horizon: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            station_limit: DEFAULT_STATION_LIMIT,
            horizon: DEFAULT_HORIZON,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Sent as `X-Refresh-Token` when triggering a data refresh.
    pub refresh_token: Option<String>,

    /// Example TOML:
    /// [api]
    /// base_url = "http://127.0.0.1:8000"
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "airq", "airq")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `AIRQ_API_BASE_URL` / `AIRQ_REFRESH_TOKEN` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.set_base_url(&url).with_context(|| format!("Invalid {ENV_BASE_URL}"))?;
        }
        if let Some(token) = non_empty(ENV_REFRESH_TOKEN) {
            self.refresh_token = Some(token);
        }

        Ok(())
    }

    /// Set the backend base URL. Only `http` and `https` are accepted; a
    /// trailing slash is dropped.
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Base URL '{url}' must start with http:// or https://");
        }

        self.api.base_url = url.to_string();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.station_limit == 0 {
            bail!("station_limit must be at least 1");
        }
        if !(1..=MAX_HORIZON).contains(&self.api.horizon) {
            bail!("horizon must be within 1..={MAX_HORIZON}, got {}", self.api.horizon);
        }
        Ok(())
    }
}
