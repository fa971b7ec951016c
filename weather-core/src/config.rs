use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{cookie::DEFAULT_CSRF_COOKIE, location::Coordinates};

/// Environment variable overriding [`Config::endpoint`].
pub const ENDPOINT_ENV: &str = "WEATHER_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/get_weather/";
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json/";

/// Where the current position comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    #[default]
    Ip,
    Fixed,
    None,
}

impl GeolocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeolocationMode::Ip => "ip",
            GeolocationMode::Fixed => "fixed",
            GeolocationMode::None => "none",
        }
    }

    pub const fn all() -> &'static [GeolocationMode] {
        &[GeolocationMode::Ip, GeolocationMode::Fixed, GeolocationMode::None]
    }
}

impl std::fmt::Display for GeolocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[geolocation]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub mode: GeolocationMode,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_lookup_url: String,
    /// How long to wait for a position before giving up.
    pub timeout_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: GeolocationMode::default(),
            latitude: None,
            longitude: None,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl GeolocationConfig {
    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.latitude?, self.longitude?))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// endpoint = "http://127.0.0.1:8000/api/get_weather/"
/// home_url = "http://127.0.0.1:8000/"
///
/// [geolocation]
/// mode = "fixed"
/// latitude = 51.5
/// longitude = -0.12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL the search is POSTed to.
    pub endpoint: String,

    /// Page that sets the CSRF cookie; fetched once when `cookie` is absent.
    pub home_url: Option<String>,

    /// Raw cookie header, e.g. `csrftoken=...; sessionid=...`.
    pub cookie: Option<String>,

    pub csrf_cookie_name: String,

    pub request_timeout_secs: u64,

    pub geolocation: GeolocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            home_url: None,
            cookie: None,
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            request_timeout_secs: 15,
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides(std::env::var(ENDPOINT_ENV).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply the value of [`ENDPOINT_ENV`], if set and non-empty.
    pub fn apply_env_overrides(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
