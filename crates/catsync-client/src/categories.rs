//! Typed client for the v3 categories API.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | PUT    | `categories/{key}` | Create or update a category key |
//! | PUT    | `categories/{key}/{value}` | Create or update a category value |
//! | POST   | `categories/list` | List category keys |
//! | POST   | `categories/{key}/list` | List values of a key |
//!
//! Both PUT endpoints are upserts: repeating a call with the same body
//! leaves the server in the same state.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PrismApiError;
use crate::executor::Executor;
use crate::pagination::fetch_all;

const RESOURCE: &str = "categories";

/// Listing kind for category keys and values.
pub const CATEGORY_KIND: &str = "category";

/// Body of `PUT categories/{key}`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryKeyBody {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PUT categories/{key}/{value}`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryValueBody {
    pub value: String,
    pub description: String,
}

/// Category key or value as returned by the API.
///
/// Only the fields this tool reads are modeled; the rest are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_defined: bool,
}

/// Client for the categories API.
#[derive(Debug, Clone)]
pub struct CategoryClient {
    exec: Executor,
}

impl CategoryClient {
    pub(crate) fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// Create or update a category key.
    ///
    /// Calls `PUT {base_url}/categories/{key}`.
    pub async fn upsert_key(
        &self,
        key: &str,
        description: Option<&str>,
    ) -> Result<CategoryRecord, PrismApiError> {
        let url = self.exec.url(&[RESOURCE, key])?;
        let body = to_body(
            &CategoryKeyBody {
                name: key.to_string(),
                description: description.map(str::to_string),
            },
            key,
        )?;
        let resp = self.exec.execute(Method::PUT, url, Some(&body)).await?;
        decode(resp, &format!("PUT categories/{key}"))
    }

    /// Create or update a value under an existing key.
    ///
    /// Calls `PUT {base_url}/categories/{key}/{value}`.
    pub async fn upsert_value(
        &self,
        key: &str,
        value: &str,
        description: &str,
    ) -> Result<CategoryRecord, PrismApiError> {
        let url = self.exec.url(&[RESOURCE, key, value])?;
        let body = to_body(
            &CategoryValueBody {
                value: value.to_string(),
                description: description.to_string(),
            },
            key,
        )?;
        let resp = self.exec.execute(Method::PUT, url, Some(&body)).await?;
        decode(resp, &format!("PUT categories/{key}/{value}"))
    }

    /// List every category key, including system-defined ones.
    pub async fn list_keys(&self, page_size: u32) -> Result<Vec<CategoryRecord>, PrismApiError> {
        let raw = fetch_all(&self.exec, &[RESOURCE], CATEGORY_KIND, page_size).await?;
        raw.into_iter()
            .map(|v| decode(v, "POST categories/list"))
            .collect()
    }

    /// List every value of `key`.
    pub async fn list_values(
        &self,
        key: &str,
        page_size: u32,
    ) -> Result<Vec<CategoryRecord>, PrismApiError> {
        let raw = fetch_all(&self.exec, &[RESOURCE, key], CATEGORY_KIND, page_size).await?;
        raw.into_iter()
            .map(|v| decode(v, &format!("POST categories/{key}/list")))
            .collect()
    }
}

fn to_body<T: Serialize>(body: &T, key: &str) -> Result<Value, PrismApiError> {
    serde_json::to_value(body).map_err(|source| PrismApiError::Deserialization {
        endpoint: format!("PUT categories/{key}"),
        source,
    })
}

fn decode(value: Value, endpoint: &str) -> Result<CategoryRecord, PrismApiError> {
    // Some Prism builds answer an upsert with an empty body.
    if value.is_null() {
        return Ok(CategoryRecord::default());
    }
    serde_json::from_value(value).map_err(|source| PrismApiError::Deserialization {
        endpoint: endpoint.to_string(),
        source,
    })
}
