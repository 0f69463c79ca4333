//! # catsync-client -- Typed Rust client for the Prism Central v3 API
//!
//! Provides typed access to the parts of the v3 API that category and
//! Flow policy provisioning needs:
//! - **Categories** — key and value upserts, listings
//! - **Network security rules** — listing and creation
//! - **Tasks** — status polling for asynchronous intents
//!
//! ## Architecture
//!
//! Every call goes through one [`Executor`]: a single authenticated attempt
//! per call, no retries. List endpoints are walked page by page with
//! [`pagination::fetch_all`]. All calls are awaited one after the other;
//! the crate never issues requests concurrently.
//!
//! ## API Path Convention
//!
//! `https://{host}:9440/api/nutanix/v3/{resource}`. Listings are
//! `POST {resource}/list` with `{kind, offset, length}`.

pub mod categories;
pub mod config;
pub mod error;
pub mod executor;
pub mod pagination;
pub mod security_rules;
pub mod tasks;

pub use config::{ConfigError, Credential, PrismConfig};
pub use error::PrismApiError;
pub use executor::Executor;
pub use pagination::{fetch_all, PageRequest, PageResponse, PageSource, DEFAULT_PAGE_SIZE};
pub use reqwest::Method;

/// Top-level Prism Central client. Holds sub-clients for each resource.
#[derive(Debug, Clone)]
pub struct PrismClient {
    exec: Executor,
    categories: categories::CategoryClient,
    security_rules: security_rules::SecurityRuleClient,
    tasks: tasks::TaskClient,
}

impl PrismClient {
    /// Create a new client from configuration.
    pub fn new(config: &PrismConfig) -> Result<Self, PrismApiError> {
        let exec = Executor::new(config)?;
        Ok(Self {
            categories: categories::CategoryClient::new(exec.clone()),
            security_rules: security_rules::SecurityRuleClient::new(exec.clone()),
            tasks: tasks::TaskClient::new(exec.clone()),
            exec,
        })
    }

    /// Raw executor, for endpoints without a typed sub-client.
    pub fn executor(&self) -> &Executor {
        &self.exec
    }

    /// Access the categories client.
    pub fn categories(&self) -> &categories::CategoryClient {
        &self.categories
    }

    /// Access the network security rules client.
    pub fn security_rules(&self) -> &security_rules::SecurityRuleClient {
        &self.security_rules
    }

    /// Access the tasks client.
    pub fn tasks(&self) -> &tasks::TaskClient {
        &self.tasks
    }
}
