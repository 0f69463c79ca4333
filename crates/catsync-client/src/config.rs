//! Prism Central client configuration.
//!
//! Holds the API base URL and the credential used for every call. The
//! default base URL follows the v3 layout:
//! `https://{host}:9440/api/nutanix/v3/`.

use url::Url;
use zeroize::Zeroizing;

/// Default Prism Central API port.
pub const DEFAULT_PORT: u16 = 9440;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path of the v3 API relative to the server root.
const API_PATH: &str = "api/nutanix/v3/";

/// Username/secret pair sent as HTTP Basic authentication.
///
/// Custom `Debug` implementation redacts the password to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl Credential {
    /// Build a credential, rejecting empty fields.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let username = username.into();
        let password = Zeroizing::new(password.into());
        if username.trim().is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        if password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        Ok(Self { username, password })
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for connecting to a Prism Central instance.
#[derive(Debug, Clone)]
pub struct PrismConfig {
    /// Base URL of the v3 API, always ending in `/`.
    pub base_url: Url,
    pub credential: Credential,
    /// Verify the server certificate. Lab deployments run self-signed
    /// certificates, so this is off unless asked for.
    pub verify_tls: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl PrismConfig {
    /// Configuration for `https://{host}:{port}/api/nutanix/v3/`.
    pub fn new(host: &str, port: u16, credential: Credential) -> Result<Self, ConfigError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        let raw = format!("https://{host}:{port}/{API_PATH}");
        let base_url =
            Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(raw.clone(), e.to_string()))?;
        Ok(Self {
            base_url,
            credential,
            verify_tls: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Configuration for an explicit API base URL (proxies, test doubles).
    ///
    /// A missing trailing slash is added so that relative resource paths
    /// join under the base instead of replacing its last segment.
    pub fn with_base_url(raw: &str, credential: Credential) -> Result<Self, ConfigError> {
        let mut base_url =
            Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(
                raw.to_string(),
                "URL cannot be used as a base".into(),
            ));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            credential,
            verify_tls: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

/// Configuration errors. All of them are detected before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Prism Central host is required")]
    MissingHost,
    #[error("Prism Central username is required")]
    MissingUsername,
    #[error("Prism Central password is required")]
    MissingPassword,
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}
