//! # Settings File
//!
//! YAML description of what a run should provision:
//!
//! ```yaml
//! prism:
//!   host: pc.lab.local
//!   username: admin
//!   password: secret        # or CATSYNC_PASSWORD
//! security:
//!   mode: monitor
//! categories:
//!   AppType: {}
//!   Web:
//!     Frontend: "public web tier"
//!     Backend:
//! ```
//!
//! Only presence is checked; values are passed to the API as written.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};

use catsync_client::config::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use catsync_client::security_rules::PolicyMode;
use catsync_client::{ConfigError, Credential, PrismConfig, DEFAULT_PAGE_SIZE};

/// Environment variable that supplies (and overrides) the password.
pub const PASSWORD_ENV: &str = "CATSYNC_PASSWORD";

/// Category key → value → description.
pub type CategoryMap = BTreeMap<String, BTreeMap<String, String>>;

/// Top-level settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub prism: PrismSettings,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub categories: CategoryMap,
}

/// Connection section.
#[derive(Clone, Deserialize)]
pub struct PrismSettings {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Full API base URL; takes precedence over `host`/`port`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PrismSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrismSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Security rule section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Create one rule per category value.
    pub enabled: bool,
    pub mode: PolicyMode,
    pub rule_prefix: String,
    pub wait_for_tasks: bool,
    pub poll_interval_secs: u64,
    pub max_polls: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: PolicyMode::Monitor,
            rule_prefix: "catsync-".into(),
            wait_for_tasks: true,
            poll_interval_secs: 2,
            max_polls: 30,
        }
    }
}

impl SecuritySettings {
    /// Name of the rule that scopes `key: value`.
    pub fn rule_name(&self, key: &str, value: &str) -> String {
        format!("{}{key}-{value}", self.rule_prefix)
    }
}

impl Settings {
    /// Read and check a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    /// Parse and check settings from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(raw).context("failed to parse YAML")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be greater than zero");
        }
        if self.security.max_polls == 0 {
            bail!("security.max_polls must be greater than zero");
        }
        for (key, values) in &self.categories {
            if key.trim().is_empty() {
                bail!("category keys must not be blank");
            }
            if values.keys().any(|v| v.trim().is_empty()) {
                bail!("category {key} has a blank value");
            }
        }
        Ok(())
    }

    /// Build the client configuration.
    ///
    /// `env_password`, when set, wins over the password in the file.
    pub fn prism_config(&self, env_password: Option<String>) -> Result<PrismConfig, ConfigError> {
        let prism = &self.prism;
        let username = prism.username.clone().ok_or(ConfigError::MissingUsername)?;
        let password = env_password
            .filter(|p| !p.is_empty())
            .or_else(|| prism.password.clone())
            .ok_or(ConfigError::MissingPassword)?;
        let credential = Credential::new(username, password)?;

        let mut config = match &prism.base_url {
            Some(base_url) => PrismConfig::with_base_url(base_url, credential)?,
            None => {
                let host = prism.host.as_deref().ok_or(ConfigError::MissingHost)?;
                PrismConfig::new(host, prism.port, credential)?
            }
        };
        config.verify_tls = prism.verify_tls;
        config.timeout_secs = prism.timeout_secs;
        Ok(config)
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Accepts `Key:` and `Value:` with no body as an empty map / empty
/// description.
fn deserialize_categories<'de, D>(deserializer: D) -> Result<CategoryMap, D::Error>
where
    D: Deserializer<'de>,
{
    type Raw = Option<BTreeMap<String, Option<BTreeMap<String, Option<String>>>>>;
    let raw = Raw::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, values)| {
            let values = values
                .unwrap_or_default()
                .into_iter()
                .map(|(value, description)| (value, description.unwrap_or_default()))
                .collect();
            (key, values)
        })
        .collect())
}
