//! Driver configuration.
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! then overrides collected from the environment and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Corpus location relative to `$HOME` when none is configured.
pub const DEFAULT_CORPUS: &str = "src/toplist/top-1m.txt";

/// Driver configuration (TOML).
///
/// Every key is optional; missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DriverConfig {
    /// URL corpus, one entry per line.
    pub corpus: PathBuf,

    /// Checker program followed by its leading arguments.
    pub checker: Vec<String>,

    /// Extra flag forwarded verbatim to the checker (e.g. `--debug=all`).
    pub debug: Option<String>,

    /// Fixed shuffle seed. Unset means fresh entropy on every run.
    pub seed: Option<u64>,

    /// Info log: headers plus checker stdout.
    pub info_log: PathBuf,

    /// Diagnostic log: headers plus checker stderr.
    pub diag_log: PathBuf,

    /// Value for `LANG` and `LC_ALL` in every checker process.
    pub locale: String,

    /// Link hops the checker may follow from each target URL.
    pub max_recursion_depth: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            corpus: default_corpus_path(),
            checker: vec!["python3".to_string(), "linkchecker".to_string()],
            debug: None,
            seed: None,
            info_log: PathBuf::from("toplist.log"),
            diag_log: PathBuf::from("toplist.err.log"),
            locale: "C".to_string(),
            max_recursion_depth: 1,
        }
    }
}

/// Values supplied by the environment or command line.
///
/// `None` leaves the underlying layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub corpus: Option<PathBuf>,
    /// Whitespace-separated command line, e.g. `python3 -O linkchecker`.
    pub checker: Option<String>,
    pub debug: Option<String>,
    pub seed: Option<u64>,
    pub info_log: Option<PathBuf>,
    pub diag_log: Option<PathBuf>,
    pub locale: Option<String>,
}

impl DriverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.corpus.as_os_str().is_empty() {
            return Err(anyhow!("corpus must be non-empty"));
        }
        if self.checker.is_empty() || self.checker[0].trim().is_empty() {
            return Err(anyhow!("checker must be a non-empty array"));
        }
        if let Some(debug) = &self.debug
            && debug.trim().is_empty()
        {
            return Err(anyhow!("debug must be non-empty when set"));
        }
        if self.info_log.as_os_str().is_empty() || self.diag_log.as_os_str().is_empty() {
            return Err(anyhow!("info_log and diag_log must be non-empty"));
        }
        if self.info_log == self.diag_log {
            return Err(anyhow!(
                "info_log and diag_log must differ (both {})",
                self.info_log.display()
            ));
        }
        crate::locale::validate(&self.locale)?;
        if self.max_recursion_depth == 0 {
            return Err(anyhow!("max_recursion_depth must be > 0"));
        }
        Ok(())
    }

    /// Apply environment/command-line overrides on top of this config.
    pub fn apply(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(corpus) = &overrides.corpus {
            self.corpus = corpus.clone();
        }
        if let Some(checker) = &overrides.checker {
            self.checker = checker.split_whitespace().map(str::to_string).collect();
        }
        if let Some(debug) = &overrides.debug {
            // An empty override clears a flag set in the config file.
            self.debug = Some(debug.clone()).filter(|flag| !flag.trim().is_empty());
        }
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(info_log) = &overrides.info_log {
            self.info_log = info_log.clone();
        }
        if let Some(diag_log) = &overrides.diag_log {
            self.diag_log = diag_log.clone();
        }
        if let Some(locale) = &overrides.locale {
            self.locale = locale.clone();
        }
        self.validate()?;
        Ok(self)
    }
}

/// Load config from a TOML file, or the defaults when no file is named.
///
/// A named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<DriverConfig> {
    let Some(path) = path else {
        let cfg = DriverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    };
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DriverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// `$HOME/src/toplist/top-1m.txt`, or the bare relative path without `HOME`.
pub fn default_corpus_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_CORPUS),
        _ => PathBuf::from(DEFAULT_CORPUS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_file_returns_default() {
        let cfg = load_config(None).expect("load");
        assert_eq!(cfg, DriverConfig::default());
        assert_eq!(cfg.max_recursion_depth, 1);
        assert_eq!(cfg.locale, "C");
    }

    #[test]
    fn load_missing_named_file_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_config(Some(&temp.path().join("missing.toml"))).expect_err("missing");
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("toplist.toml");
        fs::write(
            &path,
            "corpus = \"/data/top.txt\"\nchecker = [\"linkchecker\"]\nseed = 7\n",
        )
        .expect("write");

        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.corpus, PathBuf::from("/data/top.txt"));
        assert_eq!(cfg.checker, vec!["linkchecker"]);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.info_log, PathBuf::from("toplist.log"));
        assert_eq!(cfg.debug, None);
    }

    #[test]
    fn rejects_zero_recursion_depth() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("toplist.toml");
        fs::write(&path, "max_recursion_depth = 0\n").expect("write");
        let err = load_config(Some(&path)).expect_err("invalid");
        assert!(format!("{err:#}").contains("max_recursion_depth"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let base = DriverConfig {
            debug: Some("--debug=all".to_string()),
            ..DriverConfig::default()
        };
        let overrides = ConfigOverrides {
            checker: Some("python3 -O  linkchecker".to_string()),
            seed: Some(42),
            info_log: Some(PathBuf::from("out/info.log")),
            ..ConfigOverrides::default()
        };
        let merged = base.apply(&overrides).expect("merge");
        assert_eq!(merged.checker, vec!["python3", "-O", "linkchecker"]);
        assert_eq!(merged.seed, Some(42));
        assert_eq!(merged.info_log, PathBuf::from("out/info.log"));
        assert_eq!(merged.debug.as_deref(), Some("--debug=all"));
    }

    #[test]
    fn empty_debug_override_clears_flag() {
        let base = DriverConfig {
            debug: Some("--debug=all".to_string()),
            ..DriverConfig::default()
        };
        let overrides = ConfigOverrides {
            debug: Some(String::new()),
            ..ConfigOverrides::default()
        };
        let merged = base.apply(&overrides).expect("merge");
        assert_eq!(merged.debug, None);
    }

    #[test]
    fn rejects_blank_checker_override() {
        let overrides = ConfigOverrides {
            checker: Some("   ".to_string()),
            ..ConfigOverrides::default()
        };
        let err = DriverConfig::default()
            .apply(&overrides)
            .expect_err("blank checker");
        assert!(err.to_string().contains("checker"));
    }

    #[test]
    fn rejects_shared_log_path() {
        let overrides = ConfigOverrides {
            diag_log: Some(PathBuf::from("toplist.log")),
            ..ConfigOverrides::default()
        };
        let err = DriverConfig::default()
            .apply(&overrides)
            .expect_err("same path");
        assert!(err.to_string().contains("must differ"));
    }
}
