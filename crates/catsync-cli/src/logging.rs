//! Console and log-file output.
//!
//! Every event the driver emits carries a `tag` field naming its category:
//!
//! | Tag | Level | Used for |
//! |-----|-------|----------|
//! | `STEP` | info | start of a provisioning step |
//! | `INFO` | info | neutral progress |
//! | `SUCCESS` | info | a change applied |
//! | `DATA` | info | counts and values read from the server |
//! | `SUM` | info | end-of-run summary |
//! | `WARNING` | warn | skipped input, suspicious server data |
//! | `ERROR` | error | the failure that ends the run |
//! | `DEBUG` | debug | request-level detail |

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Category of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Info,
    Warning,
    Error,
    Sum,
    Success,
    Step,
    Debug,
    Data,
}

impl LogTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Sum => "SUM",
            Self::Success => "SUCCESS",
            Self::Step => "STEP",
            Self::Debug => "DEBUG",
            Self::Data => "DATA",
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter directive for the chosen verbosity. `--debug` opens up this
/// tool's own crates without drowning the output in HTTP stack internals.
pub fn filter_directive(debug: bool) -> &'static str {
    if debug {
        "info,catsync=debug,catsync_cli=debug,catsync_client=debug"
    } else {
        "info"
    }
}

/// Install the global subscriber: timestamped lines on stderr, plus the
/// same lines without colors appended to `log_file` when given.
///
/// `RUST_LOG` takes precedence over `debug` when set.
pub fn init(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(debug)));
    init_with_filter(filter, log_file)
}

/// [`init`] with an explicit filter, ignoring `RUST_LOG`.
pub fn init_with_filter(filter: EnvFilter, log_file: Option<&Path>) -> Result<()> {
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_render_upper_case() {
        let all = [
            LogTag::Info,
            LogTag::Warning,
            LogTag::Error,
            LogTag::Sum,
            LogTag::Success,
            LogTag::Step,
            LogTag::Debug,
            LogTag::Data,
        ];
        let rendered: Vec<String> = all.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["INFO", "WARNING", "ERROR", "SUM", "SUCCESS", "STEP", "DEBUG", "DATA"]
        );
    }

    #[test]
    fn debug_flag_widens_filter() {
        assert_eq!(filter_directive(false), "info");
        assert!(filter_directive(true).contains("catsync_client=debug"));
        assert!(EnvFilter::try_new(filter_directive(true)).is_ok());
    }

    #[test]
    fn init_writes_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catsync.log");
        init_with_filter(EnvFilter::new(filter_directive(false)), Some(&path)).unwrap();
        tracing::info!(tag = %LogTag::Step, "log file probe");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("log file probe"));
        assert!(contents.contains("tag=STEP"));
    }
}
