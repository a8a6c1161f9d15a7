//! Test-only checkers and log helpers.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::checker::{CheckInvocation, CheckStatus, Checker};
use crate::logs::RunLogs;

/// Behaviour of [`ScriptedChecker`] for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedCheck {
    /// Write `OUT`/`ERR` and exit with this code.
    Exit(i32),
    /// Write `ERR` and report termination by SIGKILL.
    Signal,
    /// Behave as if the checker binary were missing.
    LaunchFailure,
}

/// In-process checker returning predetermined outcomes per URL.
///
/// URLs without an entry exit 0 after writing `OUT` to stdout and `ERR` to stderr.
#[derive(Debug, Default)]
pub struct ScriptedChecker {
    script: BTreeMap<String, ScriptedCheck>,
    calls: Vec<String>,
}

impl ScriptedChecker {
    pub fn with(mut self, url: &str, check: ScriptedCheck) -> Self {
        self.script.insert(url.to_string(), check);
        self
    }

    /// URLs in the order they were checked.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }
}

impl Checker for ScriptedChecker {
    fn check(&mut self, url: &str, logs: &mut RunLogs) -> Result<CheckInvocation> {
        self.calls.push(url.to_string());
        let check = self
            .script
            .get(url)
            .copied()
            .unwrap_or(ScriptedCheck::Exit(0));

        let (status, stdout, stderr): (CheckStatus, &[u8], &[u8]) = match check {
            ScriptedCheck::Exit(code) => {
                (CheckStatus::Exited(code), &b"OUT\n"[..], &b"ERR\n"[..])
            }
            ScriptedCheck::Signal => (CheckStatus::Signaled(Some(9)), &[], &b"ERR\n"[..]),
            ScriptedCheck::LaunchFailure => {
                logs.write_diag_line("toplist: failed to launch checker `scripted`")?;
                (CheckStatus::LaunchFailed("scripted".to_string()), &[], &[])
            }
        };
        let (info, diag) = logs.streams_mut();
        info.write_all(stdout).context("write scripted stdout")?;
        diag.write_all(stderr).context("write scripted stderr")?;

        Ok(CheckInvocation {
            url: url.to_string(),
            status,
            stdout_bytes: stdout.len() as u64,
            stderr_bytes: stderr.len() as u64,
        })
    }
}

/// URLs named by `Checking <url>` header lines, in log order.
pub fn header_urls(log: &str) -> Vec<String> {
    log.lines()
        .filter_map(|line| line.strip_prefix("Checking "))
        .map(str::to_string)
        .collect()
}

/// Lines that follow the header for `url`, up to the next header.
pub fn section_for(log: &str, url: &str) -> Vec<String> {
    let header = format!("Checking {url}");
    log.lines()
        .skip_while(|line| *line != header)
        .skip(1)
        .take_while(|line| !line.starts_with("Checking "))
        .map(str::to_string)
        .collect()
}

/// Shell-script stand-in for the external link checker.
///
/// The last argument is taken as the URL. URLs containing `fail` exit 3,
/// URLs containing `crash` kill themselves with SIGKILL after writing `ERR`,
/// all others print `OUT` to stdout and `ERR` to stderr. Every call is
/// recorded, see [`MockChecker::recorded_calls`].
#[derive(Debug)]
pub struct MockChecker {
    dir: tempfile::TempDir,
    script: PathBuf,
    calls_log: PathBuf,
}

impl MockChecker {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create mock checker dir")?;
        let script = dir.path().join("checker.sh");
        let calls_log = dir.path().join("calls.log");
        fs::write(&script, render_script(&calls_log))
            .with_context(|| format!("write {}", script.display()))?;
        Ok(Self {
            dir,
            script,
            calls_log,
        })
    }

    /// Value for `--checker`: the script run through `sh`, so no exec bit is needed.
    pub fn command_line(&self) -> String {
        format!("sh {}", self.script.display())
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// One entry per invocation: `<args> LANG=<lang> LC_ALL=<lc_all>`.
    pub fn recorded_calls(&self) -> Result<Vec<String>> {
        if !self.calls_log.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.calls_log)
            .with_context(|| format!("read {}", self.calls_log.display()))?;
        Ok(contents.lines().map(str::to_string).collect())
    }
}

fn render_script(calls_log: &Path) -> String {
    format!(
        r#"#!/bin/sh
for url in "$@"; do :; done
printf '%s LANG=%s LC_ALL=%s\n' "$*" "$LANG" "$LC_ALL" >> '{calls}'
case "$url" in
  *fail*) echo OUT; echo ERR >&2; exit 3 ;;
  *crash*) echo ERR >&2; kill -KILL $$ ;;
esac
echo OUT
echo ERR >&2
"#,
        calls = calls_log.display()
    )
}
