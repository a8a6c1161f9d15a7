//! Bulk regression-test driver for a recursive link checker.
//!
//! Checks every URL of a large corpus once, in random order, writing
//! `toplist.log` (checker stdout) and `toplist.err.log` (checker stderr).

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use toplist::config::{ConfigOverrides, load_config};
use toplist::{driver, exit_codes, logging};

#[derive(Parser, Debug)]
#[command(
    name = "toplist",
    version,
    about = "Run the link checker over a corpus of top-ranked sites"
)]
struct Cli {
    /// TOML config file. Values from the environment and flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
    /// URL corpus, one URL per line [default: $HOME/src/toplist/top-1m.txt].
    #[arg(long, env = "TOPLIST_CORPUS")]
    corpus: Option<PathBuf>,
    /// Checker command line, split on whitespace [default: python3 linkchecker].
    #[arg(long, env = "TOPLIST_CHECKER")]
    checker: Option<String>,
    /// Flag passed verbatim to the checker, e.g. `--debug=all`.
    #[arg(long, env = "TOPLIST_DEBUG", allow_hyphen_values = true)]
    debug: Option<String>,
    /// Fixed shuffle seed for a reproducible visiting order.
    #[arg(long, env = "TOPLIST_SEED")]
    seed: Option<u64>,
    /// Info log path [default: toplist.log].
    #[arg(long)]
    info_log: Option<PathBuf>,
    /// Diagnostic log path [default: toplist.err.log].
    #[arg(long)]
    diag_log: Option<PathBuf>,
    /// Locale pinned for the checker via LANG and LC_ALL [default: C].
    #[arg(long)]
    locale: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            corpus: self.corpus.clone(),
            checker: self.checker.clone(),
            debug: self.debug.clone(),
            seed: self.seed,
            info_log: self.info_log.clone(),
            diag_log: self.diag_log.clone(),
            locale: self.locale.clone(),
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    logging::init();
    if let Err(err) = run(&cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?.apply(&cli.overrides())?;
    debug!(?config, "configuration resolved");
    driver::run(&config)?;
    Ok(())
}
