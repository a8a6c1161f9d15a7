//! The info/diagnostic log pair written by a run.
//!
//! Both files are append-only for the lifetime of a run and are removed at
//! the start of the next one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Locations of the two run logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub info: PathBuf,
    pub diag: PathBuf,
}

impl LogPaths {
    pub fn new(info: impl Into<PathBuf>, diag: impl Into<PathBuf>) -> Self {
        Self {
            info: info.into(),
            diag: diag.into(),
        }
    }
}

/// Open handles to both run logs.
#[derive(Debug)]
pub struct RunLogs {
    paths: LogPaths,
    info: File,
    diag: File,
}

impl RunLogs {
    /// Delete logs left by a previous run, then open fresh ones.
    pub fn reset(paths: &LogPaths) -> Result<Self> {
        remove_if_exists(&paths.info)?;
        remove_if_exists(&paths.diag)?;
        Ok(Self {
            info: open_append(&paths.info)?,
            diag: open_append(&paths.diag)?,
            paths: paths.clone(),
        })
    }

    pub fn paths(&self) -> &LogPaths {
        &self.paths
    }

    /// Write `Checking <url>` to both logs and sync it to disk.
    pub fn write_header(&mut self, url: &str) -> Result<()> {
        let line = header_line(url);
        write_durable(&mut self.info, &line)
            .with_context(|| format!("write header to {}", self.paths.info.display()))?;
        write_durable(&mut self.diag, &line)
            .with_context(|| format!("write header to {}", self.paths.diag.display()))?;
        Ok(())
    }

    /// Append a driver-originated line (e.g. a launch failure) to the diagnostic log.
    pub fn write_diag_line(&mut self, message: &str) -> Result<()> {
        let line = format!("{}\n", message.trim_end());
        write_durable(&mut self.diag, &line)
            .with_context(|| format!("write {}", self.paths.diag.display()))
    }

    /// Borrow both handles at once so stdout and stderr can be drained in parallel.
    pub fn streams_mut(&mut self) -> (&mut File, &mut File) {
        (&mut self.info, &mut self.diag)
    }

    pub fn sync(&mut self) -> Result<()> {
        self.info
            .sync_data()
            .with_context(|| format!("sync {}", self.paths.info.display()))?;
        self.diag
            .sync_data()
            .with_context(|| format!("sync {}", self.paths.diag.display()))?;
        Ok(())
    }
}

pub fn header_line(url: &str) -> String {
    format!("Checking {url}\n")
}

fn write_durable(file: &mut File, line: &str) -> io::Result<()> {
    file.write_all(line.as_bytes())?;
    file.flush()?;
    file.sync_data()
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed previous log");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))
}
