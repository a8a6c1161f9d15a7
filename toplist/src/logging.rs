//! Operator-facing tracing for the driver.
//!
//! Events written to stderr during a run:
//!
//! | level | event | fields |
//! |-------|-------|--------|
//! | info  | `run started` | `urls`, `seeded`, `checker` |
//! | info  | `progress` | `done`, `total`; once every [`PROGRESS_EVERY`] URLs |
//! | info  | `run complete` | `started_at`, outcome counters, output bytes, `elapsed_ms`, log paths |
//! | debug | `url checked` | `url`, `status`, `stdout_bytes`, `stderr_bytes` |
//! | warn  | launch failure, abnormal termination, unreadable or unwritable checker output | `url` span, error |
//!
//! None of this reaches the info and diagnostic logs (see [`crate::logs`]),
//! and `RUST_LOG` has no effect on them.
//!
//! [`PROGRESS_EVERY`]: crate::driver::PROGRESS_EVERY

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or unparsable: start, progress and summary only.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Initialize the tracing subscriber.
///
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// # one line per URL checked
/// RUST_LOG=toplist=debug toplist --corpus top-1m.txt
/// ```
pub fn init() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(filter_from(directives.as_deref()))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
