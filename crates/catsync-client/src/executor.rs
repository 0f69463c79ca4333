//! HTTP call executor.
//!
//! Every Prism call goes through [`Executor::execute`]: one authenticated
//! request, one attempt, JSON in and JSON out. Errors are classified into
//! the [`PrismApiError`] taxonomy and returned immediately.
//!
//! ## Transport
//!
//! The underlying `reqwest::Client` is pinned to TLS 1.2. Certificate
//! verification is skipped unless [`PrismConfig::verify_tls`] is set, since
//! Prism Central ships with a self-signed certificate.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::config::{ConfigError, Credential, PrismConfig};
use crate::error::PrismApiError;

/// Authenticated JSON executor bound to one Prism Central instance.
#[derive(Debug, Clone)]
pub struct Executor {
    http: reqwest::Client,
    base_url: Url,
    credential: Credential,
}

impl Executor {
    /// Build the HTTP client for `config`.
    pub fn new(config: &PrismConfig) -> Result<Self, PrismApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .max_tls_version(reqwest::tls::Version::TLS_1_2)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .build()
            .map_err(|e| ConfigError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            credential: config.credential.clone(),
        })
    }

    /// Base URL of the v3 API.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a resource path under the base URL. Each segment is
    /// percent-encoded, so category keys with spaces or slashes stay intact.
    pub fn url(&self, segments: &[&str]) -> Result<Url, PrismApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ConfigError::InvalidUrl(
                    self.base_url.to_string(),
                    "URL cannot be used as a base".into(),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue one authenticated call and return the parsed JSON body.
    ///
    /// Logs a debug line before and after the call.
    pub async fn execute(
        &self,
        method: Method,
        url: Url,
        payload: Option<&Value>,
    ) -> Result<Value, PrismApiError> {
        let endpoint = self.endpoint_label(&method, &url);
        tracing::debug!(%endpoint, "calling Prism API");
        let result = self.send(method, url, payload, &endpoint).await;
        match &result {
            Ok(_) => tracing::debug!(%endpoint, "Prism API call completed"),
            Err(e) => tracing::debug!(%endpoint, error = %e, "Prism API call failed"),
        }
        result
    }

    /// Same as [`execute`](Self::execute) without the log lines. Used for
    /// status polling, where a line per poll is noise.
    pub async fn execute_quiet(
        &self,
        method: Method,
        url: Url,
        payload: Option<&Value>,
    ) -> Result<Value, PrismApiError> {
        let endpoint = self.endpoint_label(&method, &url);
        self.send(method, url, payload, &endpoint).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        payload: Option<&Value>,
        endpoint: &str,
    ) -> Result<Value, PrismApiError> {
        let mut request = self.http.request(method, url).basic_auth(
            &self.credential.username,
            Some(self.credential.password.as_str()),
        );
        if let Some(body) = payload {
            request = request.json(body);
        }

        let resp = request.send().await.map_err(|e| PrismApiError::Transport {
            endpoint: endpoint.into(),
            source: e,
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| PrismApiError::Transport {
            endpoint: endpoint.into(),
            source: e,
        })?;

        let parsed = serde_json::from_slice::<Value>(&bytes);
        if let Ok(body) = &parsed {
            if let Some((code, message)) = structured_error(body) {
                return Err(PrismApiError::Api {
                    endpoint: endpoint.into(),
                    code,
                    message,
                });
            }
        }

        if !status.is_success() {
            return Err(PrismApiError::UnexpectedStatus {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        parsed.map_err(|source| PrismApiError::Deserialization {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// `METHOD path` with the path relative to the API base, for messages.
    fn endpoint_label(&self, method: &Method, url: &Url) -> String {
        let relative = url
            .as_str()
            .strip_prefix(self.base_url.as_str())
            .unwrap_or_else(|| url.path());
        format!("{method} {relative}")
    }
}

/// Extract `(code, details)` from a Prism error body.
///
/// Prism reports failures as
/// `{"code": 400, "message_list": [{"details": "..."}], "state": "ERROR"}`.
/// All `details` entries are joined with `"; "`.
pub(crate) fn structured_error(body: &Value) -> Option<(i64, String)> {
    let code = body.get("code")?;
    let code = code
        .as_i64()
        .or_else(|| code.as_str().and_then(|s| s.parse().ok()))?;
    let details: Vec<String> = body
        .get("message_list")?
        .as_array()?
        .iter()
        .filter_map(|m| m.get("details"))
        .map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    if details.is_empty() {
        return None;
    }
    Some((code, details.join("; ")))
}
