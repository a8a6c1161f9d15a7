//! Checker abstraction for per-URL invocation.
//!
//! The [`Checker`] trait decouples the run loop from the external link
//! checker. Production runs use [`CommandChecker`], which spawns the checker
//! and streams its output into the run logs; tests substitute scripted
//! checkers that never spawn a process.

use std::fmt;
use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::config::DriverConfig;
use crate::locale;
use crate::logs::RunLogs;
use crate::process::{StreamedOutput, drain_to, spawn_piped};

/// Suppresses the checker's periodic progress output.
pub const DISABLE_STATUS_FLAG: &str = "--disable-status-reporting";

/// How one checker invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// The checker exited normally with this code.
    Exited(i32),
    /// The checker was terminated abnormally (by a signal on unix).
    Signaled(Option<i32>),
    /// The checker could not be started at all.
    LaunchFailed(String),
}

impl CheckStatus {
    pub fn from_exit_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => CheckStatus::Exited(code),
            None => CheckStatus::Signaled(terminating_signal(status)),
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Exited(code) => write!(f, "exit code {code}"),
            CheckStatus::Signaled(Some(signal)) => write!(f, "killed by signal {signal}"),
            CheckStatus::Signaled(None) => write!(f, "terminated abnormally"),
            CheckStatus::LaunchFailed(reason) => write!(f, "launch failed: {reason}"),
        }
    }
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// Record of a single invocation. Dropped once the run summary absorbs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInvocation {
    pub url: String,
    pub status: CheckStatus,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
}

/// Abstraction over link checker backends.
pub trait Checker {
    /// Check `url`, appending its stdout to the info log and its stderr to the
    /// diagnostic log. Checker failures are reported through
    /// [`CheckInvocation::status`]; `Err` is reserved for failures of the logs.
    fn check(&mut self, url: &str, logs: &mut RunLogs) -> Result<CheckInvocation>;
}

/// Fixed command line used for every URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerCommand {
    pub program: String,
    pub leading_args: Vec<String>,
    pub max_recursion_depth: u32,
    pub debug: Option<String>,
    pub locale: String,
}

impl CheckerCommand {
    pub fn from_config(cfg: &DriverConfig) -> Result<Self> {
        let (program, leading_args) = cfg
            .checker
            .split_first()
            .context("checker command is empty")?;
        Ok(Self {
            program: program.clone(),
            leading_args: leading_args.to_vec(),
            max_recursion_depth: cfg.max_recursion_depth,
            debug: cfg.debug.clone(),
            locale: cfg.locale.clone(),
        })
    }

    /// Arguments following the program name, ending with `url`.
    pub fn args_for(&self, url: &str) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push(format!("--max-recursion-depth={}", self.max_recursion_depth));
        args.push(DISABLE_STATUS_FLAG.to_string());
        if let Some(debug) = &self.debug {
            args.push(debug.clone());
        }
        args.push(url.to_string());
        args
    }

    pub fn command_for(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(url));
        locale::pin(&mut cmd, &self.locale);
        cmd
    }
}

/// Checker that spawns the external link checker once per URL.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    command: CheckerCommand,
}

impl CommandChecker {
    pub fn new(command: CheckerCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &CheckerCommand {
        &self.command
    }
}

impl Checker for CommandChecker {
    #[instrument(skip_all, fields(url = %url))]
    fn check(&mut self, url: &str, logs: &mut RunLogs) -> Result<CheckInvocation> {
        let child = match spawn_piped(self.command.command_for(url)) {
            Ok(child) => child,
            Err(err) => {
                warn!(program = %self.command.program, err = %err, "failed to launch checker");
                logs.write_diag_line(&format!(
                    "toplist: failed to launch checker `{}`: {}",
                    self.command.program, err
                ))?;
                return Ok(CheckInvocation {
                    url: url.to_string(),
                    status: CheckStatus::LaunchFailed(err.to_string()),
                    stdout_bytes: 0,
                    stderr_bytes: 0,
                });
            }
        };

        let (info, diag) = logs.streams_mut();
        let output = drain_to(child, info, diag)
            .with_context(|| format!("capture checker output for {url}"))?;
        record_read_errors(&output, logs)?;
        let status = CheckStatus::from_exit_status(output.status);
        match &status {
            CheckStatus::Exited(0) => debug!("checker succeeded"),
            CheckStatus::Exited(code) => debug!(code, "checker exited non-zero"),
            other => warn!(status = %other, "checker terminated abnormally"),
        }

        Ok(CheckInvocation {
            url: url.to_string(),
            status,
            stdout_bytes: output.stdout_bytes,
            stderr_bytes: output.stderr_bytes,
        })
    }
}

/// One diagnostic line per output stream that could not be read to the end.
fn record_read_errors(output: &StreamedOutput, logs: &mut RunLogs) -> Result<()> {
    let streams = [
        ("stdout", &output.stdout_read_error),
        ("stderr", &output.stderr_read_error),
    ];
    for (stream, err) in streams {
        if let Some(err) = err {
            logs.write_diag_line(&format!("toplist: failed to read checker {stream}: {err}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(debug: Option<&str>) -> CheckerCommand {
        CheckerCommand {
            program: "python3".to_string(),
            leading_args: vec!["linkchecker".to_string()],
            max_recursion_depth: 1,
            debug: debug.map(str::to_string),
            locale: "C".to_string(),
        }
    }

    #[test]
    fn builds_fixed_argument_set() {
        let args = command(None).args_for("http://example.com");
        assert_eq!(
            args,
            vec![
                "linkchecker",
                "--max-recursion-depth=1",
                "--disable-status-reporting",
                "http://example.com",
            ]
        );
    }

    #[test]
    fn inserts_debug_flag_before_url() {
        let args = command(Some("--debug=all")).args_for("http://example.com");
        assert_eq!(args[args.len() - 2], "--debug=all");
        assert_eq!(args[args.len() - 1], "http://example.com");
    }

    #[test]
    fn from_config_splits_program() {
        let cfg = DriverConfig {
            checker: vec!["python3".into(), "-O".into(), "linkchecker".into()],
            ..DriverConfig::default()
        };
        let cmd = CheckerCommand::from_config(&cfg).expect("command");
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.leading_args, vec!["-O", "linkchecker"]);
        assert_eq!(cmd.max_recursion_depth, 1);
    }

    #[test]
    fn status_display_is_readable() {
        assert_eq!(CheckStatus::Exited(2).to_string(), "exit code 2");
        assert_eq!(
            CheckStatus::Signaled(Some(9)).to_string(),
            "killed by signal 9"
        );
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_stream_is_noted_in_diag_log() {
        use std::io;
        use std::os::unix::process::ExitStatusExt;

        use crate::logs::LogPaths;

        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LogPaths::new(temp.path().join("info.log"), temp.path().join("diag.log"));
        let mut logs = RunLogs::reset(&paths).expect("logs");
        let output = StreamedOutput {
            status: ExitStatus::from_raw(0),
            stdout_bytes: 0,
            stderr_bytes: 4,
            stdout_read_error: Some(io::Error::other("pipe went away")),
            stderr_read_error: None,
        };

        record_read_errors(&output, &mut logs).expect("record");

        let diag = std::fs::read_to_string(&paths.diag).expect("diag");
        assert_eq!(diag, "toplist: failed to read checker stdout: pipe went away\n");
        assert_eq!(std::fs::read_to_string(&paths.info).expect("info"), "");
    }

    #[cfg(unix)]
    #[test]
    fn signal_termination_is_not_an_exit() {
        use std::os::unix::process::ExitStatusExt;
        let status = ExitStatus::from_raw(9);
        assert_eq!(
            CheckStatus::from_exit_status(status),
            CheckStatus::Signaled(Some(9))
        );
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(CheckStatus::from_exit_status(status), CheckStatus::Exited(3));
    }
}
