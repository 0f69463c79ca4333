//! # catsync-cli — Category and Flow policy provisioning
//!
//! Provides the `catsync` command-line interface: read a YAML settings
//! file, then upsert its categories and their security rules on Prism
//! Central.
//!
//! ```bash
//! catsync --config catsync.yaml
//! catsync --config catsync.yaml --log-file run.log --debug
//! catsync --history
//! ```
//!
//! ## Exit Codes
//!
//! - `0` — run completed.
//! - `1` — settings or credential problem, detected before any request.
//! - `2` — a request failed; earlier upserts stay applied.

pub mod apply;
pub mod history;
pub mod logging;
pub mod settings;

use std::path::Path;

use catsync_client::PrismClient;

use crate::logging::LogTag;
use crate::settings::Settings;

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 1;
pub const EXIT_RUN_FAILED: u8 = 2;

/// Load settings from `config_path` and provision them. Returns the
/// process exit code.
///
/// Runs on a current-thread runtime: requests go out one at a time.
pub fn run(config_path: &Path, env_password: Option<String>) -> u8 {
    let settings = match Settings::load(config_path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(tag = %LogTag::Error, "{e:#}");
            return EXIT_CONFIG;
        }
    };

    let client = match settings
        .prism_config(env_password)
        .map_err(catsync_client::PrismApiError::from)
        .and_then(|config| PrismClient::new(&config))
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(tag = %LogTag::Error, "{e}");
            return EXIT_CONFIG;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(tag = %LogTag::Error, "failed to start async runtime: {e}");
            return EXIT_CONFIG;
        }
    };

    tracing::info!(
        tag = %LogTag::Info,
        endpoint = %client.executor().base_url(),
        categories = settings.categories.len(),
        "starting run"
    );

    match runtime.block_on(apply::apply(&client, &settings)) {
        Ok(_) => EXIT_OK,
        Err(e) => {
            tracing::error!(tag = %LogTag::Error, "{e:#}");
            EXIT_RUN_FAILED
        }
    }
}
