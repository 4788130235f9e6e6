//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use hx_api::{Credentials, DEFAULT_BASE_URL, HttpOptions};
use serde::{Deserialize, Deserializer, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Harvest personal access token.
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: Option<String>,
    /// Harvest account ID.
    #[serde(default, deserialize_with = "lenient_string")]
    pub account_id: Option<String>,
    /// Root of the Harvest v2 API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("account_id", &self.account_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            account_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (HARVEST_TOKEN, HARVEST_ID, HARVEST_*)
        figment = figment.merge(Env::prefixed("HARVEST_").map(|key| env_key(key.as_str()).into()));

        figment.extract()
    }

    /// Replaces the credentials with values given on the command line.
    #[must_use]
    pub fn with_overrides(mut self, token: Option<String>, account_id: Option<String>) -> Self {
        if token.is_some() {
            self.token = token;
        }
        if account_id.is_some() {
            self.account_id = account_id;
        }
        self
    }

    /// Validated credentials, or an error naming where to set them.
    pub fn credentials(&self) -> Result<Credentials> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("missing Harvest token (set HARVEST_TOKEN, --token or config.toml)"))?;
        let account_id = self.account_id.as_deref().ok_or_else(|| {
            anyhow!("missing Harvest account ID (set HARVEST_ID, --account-id or config.toml)")
        })?;
        Ok(Credentials::new(token, account_id)?)
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Maps a `HARVEST_*` variable (prefix stripped) to its config key.
///
/// `HARVEST_ID` is the conventional name for the account ID.
fn env_key(key: &str) -> &str {
    if key.eq_ignore_ascii_case("id") {
        "account_id"
    } else {
        key
    }
}

/// Accepts numbers where a string is expected.
///
/// Account IDs are numeric, and both TOML and environment values may arrive
/// as integers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

/// Returns the platform-specific config directory for hx.
///
/// On Linux: `~/.config/hx`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hx"))
}
