use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::alerts::default_alert_preferences;
use crate::model::WeatherAlertPreference;
use crate::provider::ProviderId;

/// Configuration for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,

    /// Overrides the public endpoint, e.g. for a proxy or a test server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration and local preferences stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Weather strategy: "openweather" (default) or "metno".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_provider: Option<String>,

    /// Per-request timeout. Expiry is handled like any other network error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sent with every request; MET Norway rejects anonymous clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Location shown when no query is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_location: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default = "default_alert_preferences")]
    pub alerts: Vec<WeatherAlertPreference>,
}

const fn default_timeout_secs() -> u64 {
    8
}

fn default_user_agent() -> String {
    format!("skyboard/{} (+https://github.com/skyboard/skyboard)", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_provider: None,
            providers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            default_location: None,
            alerts: default_alert_preferences(),
        }
    }
}

/// Keys shipped in sample configs, e.g. `YOUR_NEWSAPI_API_KEY_HERE`.
fn is_placeholder_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    upper.starts_with("YOUR_") && upper.ends_with("_HERE")
}

impl Config {
    /// The weather strategy, defaulting to OpenWeather.
    pub fn weather_provider_id(&self) -> Result<ProviderId> {
        match self.weather_provider.as_deref() {
            None => Ok(ProviderId::OpenWeather),
            Some(s) => ProviderId::try_from(s),
        }
    }

    pub fn set_weather_provider(&mut self, id: ProviderId) -> Result<()> {
        if !id.is_weather_provider() {
            return Err(anyhow!("Provider '{id}' cannot supply weather. Use openweather or metno."));
        }
        self.weather_provider = Some(id.as_str().to_string());
        Ok(())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk (or defaults), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            // First run: no config file.
            Self::default()
        };

        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Replace stored keys with the ones found through `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ProviderId::all() {
            let Some(var) = id.env_var() else { continue };
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                self.providers.entry(id.as_str().to_string()).or_default().api_key = key;
            }
        }
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
        let dirs = ProjectDirs::from("dev", "skyboard", "skyboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key, keeping any base URL override.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().api_key = api_key;
    }

    pub fn set_provider_base_url(&mut self, provider_id: ProviderId, base_url: impl Into<String>) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().base_url =
            Some(base_url.into());
    }

    /// Returns a usable API key. Empty and placeholder keys count as missing.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.trim())
            .filter(|key| !key.is_empty() && !is_placeholder_key(key))
    }

    /// Configured base URL without a trailing slash, or the public endpoint.
    pub fn provider_base_url(&self, provider_id: ProviderId) -> &str {
        self.provider_config(provider_id)
            .and_then(|cfg| cfg.base_url.as_deref())
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or_else(|| provider_id.default_base_url())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }
}
