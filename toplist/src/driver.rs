//! Run orchestration.
//!
//! Loads the corpus, shuffles it, resets the logs and checks every URL in
//! turn. A checker failure of any kind only affects its own URL.

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::checker::{CheckInvocation, CheckStatus, Checker, CheckerCommand, CommandChecker};
use crate::config::DriverConfig;
use crate::corpus::Corpus;
use crate::logs::{LogPaths, RunLogs};
use crate::order::{RunOrder, shuffle};

/// Emit a progress event after this many URLs.
pub const PROGRESS_EVERY: usize = 1000;

/// Counters for a finished run. Reported to the operator, never written to the run logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub urls: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub signaled: usize,
    pub launch_failures: usize,
    /// Checker output copied into the info and diagnostic logs.
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
    pub elapsed_ms: u64,
}

impl RunSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            urls: 0,
            succeeded: 0,
            failed: 0,
            signaled: 0,
            launch_failures: 0,
            stdout_bytes: 0,
            stderr_bytes: 0,
            elapsed_ms: 0,
        }
    }

    fn record(&mut self, invocation: &CheckInvocation) {
        self.urls += 1;
        self.stdout_bytes += invocation.stdout_bytes;
        self.stderr_bytes += invocation.stderr_bytes;
        match invocation.status {
            CheckStatus::Exited(0) => self.succeeded += 1,
            CheckStatus::Exited(_) => self.failed += 1,
            CheckStatus::Signaled(_) => self.signaled += 1,
            CheckStatus::LaunchFailed(_) => self.launch_failures += 1,
        }
    }
}

/// Run a complete pass over the configured corpus with the external checker.
///
/// The corpus is read before the logs are touched, so an unreadable corpus
/// leaves any previous logs in place.
#[instrument(skip_all, fields(corpus = %config.corpus.display()))]
pub fn run(config: &DriverConfig) -> Result<RunSummary> {
    let corpus = Corpus::load(&config.corpus)?;
    let mut checker = CommandChecker::new(CheckerCommand::from_config(config)?);
    info!(
        urls = corpus.len(),
        seeded = config.seed.is_some(),
        checker = %checker.command().program,
        "run started"
    );

    let order = shuffle(corpus, config.seed);
    let paths = LogPaths::new(&config.info_log, &config.diag_log);
    let mut logs = RunLogs::reset(&paths).context("reset run logs")?;
    run_order(&order, &mut logs, &mut checker)
}

/// Check every URL of `order` in sequence.
///
/// Only failures to write the logs end the loop early.
pub fn run_order<C: Checker>(
    order: &RunOrder,
    logs: &mut RunLogs,
    checker: &mut C,
) -> Result<RunSummary> {
    let mut summary = RunSummary::new(Utc::now());
    let started = Instant::now();
    let total = order.len();

    for url in order.urls() {
        logs.write_header(url)?;
        let invocation = checker.check(url, logs)?;
        debug!(
            url = %invocation.url,
            status = %invocation.status,
            stdout_bytes = invocation.stdout_bytes,
            stderr_bytes = invocation.stderr_bytes,
            "url checked"
        );
        summary.record(&invocation);

        if summary.urls % PROGRESS_EVERY == 0 {
            info!(done = summary.urls, total, "progress");
        }
    }

    logs.sync()?;
    summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        started_at = %summary.started_at.to_rfc3339(),
        urls = summary.urls,
        succeeded = summary.succeeded,
        failed = summary.failed,
        signaled = summary.signaled,
        launch_failures = summary.launch_failures,
        stdout_bytes = summary.stdout_bytes,
        stderr_bytes = summary.stderr_bytes,
        elapsed_ms = summary.elapsed_ms,
        info_log = %logs.paths().info.display(),
        diag_log = %logs.paths().diag.display(),
        "run complete"
    );
    Ok(summary)
}
