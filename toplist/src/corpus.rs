//! URL corpus loading.
//!
//! The corpus is a plain text file with one URL per line. Entries are passed
//! to the checker as-is: no deduplication, no validation. A line that is not
//! valid UTF-8 is still checked, with the bad bytes replaced by U+FFFD.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

/// All URLs for one run, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    urls: Vec<String>,
}

impl Corpus {
    /// Read the corpus file. Fails only if it is missing or unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read(path).with_context(|| format!("read corpus {}", path.display()))?;
        Ok(Self::parse_bytes(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        Self::parse_bytes(contents.as_bytes())
    }

    /// One entry per non-blank line, surrounding whitespace trimmed.
    pub fn parse_bytes(contents: &[u8]) -> Self {
        let mut replaced = 0usize;
        let urls = contents
            .split(|byte| *byte == b'\n')
            .filter_map(|line| {
                let text = String::from_utf8_lossy(line);
                if matches!(text, Cow::Owned(_)) {
                    replaced += 1;
                }
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            })
            .collect();
        if replaced > 0 {
            warn!(
                lines = replaced,
                "corpus lines with invalid UTF-8 kept with replacement characters"
            );
        }
        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}
