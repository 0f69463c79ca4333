//! Prism API client error types.

/// Errors from Prism Central API calls.
///
/// No variant is retried by this crate; every error is meant to abort the
/// caller's run.
#[derive(Debug, thiserror::Error)]
pub enum PrismApiError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("HTTP error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Prism returned a structured error body (`code` + `message_list`).
    #[error("Prism API {endpoint} returned error {code}: {message}")]
    Api {
        endpoint: String,
        code: i64,
        message: String,
    },
    /// Non-2xx status without a structured error body.
    #[error("Prism API {endpoint} returned {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response body was not valid JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// A page of a paginated listing failed.
    #[error("listing {endpoint} failed for payload {payload}: {source}")]
    ListPage {
        endpoint: String,
        payload: String,
        source: Box<PrismApiError>,
    },
    /// Page size must be at least one.
    #[error("page size must be greater than zero")]
    InvalidPageSize,
    /// A server-side task finished unsuccessfully.
    #[error("task {uuid} ended in state {status}: {detail}")]
    TaskFailed {
        uuid: String,
        status: String,
        detail: String,
    },
    /// A server-side task did not finish within the allowed number of polls.
    #[error("task {uuid} still {status} after {polls} polls")]
    TaskTimeout {
        uuid: String,
        status: String,
        polls: u32,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl PrismApiError {
    /// Whether the error was detected before talking to the server.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The innermost error, looking through pagination wrappers.
    pub fn root(&self) -> &PrismApiError {
        match self {
            Self::ListPage { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn config_errors_are_flagged() {
        let err = PrismApiError::from(ConfigError::MissingPassword);
        assert!(err.is_config());
        assert!(err.to_string().contains("password is required"));
    }

    #[test]
    fn client_build_failure_is_a_config_error() {
        let err = PrismApiError::from(ConfigError::ClientBuild("no TLS backend".into()));
        assert!(err.is_config());
        assert!(err.to_string().contains("failed to build HTTP client"));
    }

    #[test]
    fn root_unwraps_list_page() {
        let err = PrismApiError::ListPage {
            endpoint: "POST categories/list".into(),
            payload: r#"{"kind":"category","offset":0,"length":100}"#.into(),
            source: Box::new(PrismApiError::Api {
                endpoint: "POST categories/list".into(),
                code: 400,
                message: "bad kind".into(),
            }),
        };
        assert!(!err.is_config());
        assert!(err.to_string().contains(r#""offset":0"#));
        assert!(matches!(err.root(), PrismApiError::Api { code: 400, .. }));
    }
}
