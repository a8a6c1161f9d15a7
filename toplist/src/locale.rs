//! Locale pinning for checker processes.
//!
//! Checker messages are translated according to the locale, so every child
//! gets the same `LANG`/`LC_ALL` regardless of the operator's shell. The
//! driver's own environment is left alone.

use std::process::Command;

use anyhow::{Result, bail};

/// Variables overwritten with the pinned locale.
pub const PINNED_VARS: [&str; 2] = ["LANG", "LC_ALL"];

/// GNU gettext consults `LANGUAGE` before `LC_ALL`; it is dropped.
pub const CLEARED_VARS: [&str; 1] = ["LANGUAGE"];

pub fn validate(locale: &str) -> Result<()> {
    if locale.trim().is_empty() {
        bail!("locale must be non-empty");
    }
    if locale.contains('=') || locale.contains('\0') {
        bail!("locale {locale:?} must not contain '=' or NUL");
    }
    Ok(())
}

/// Set the pinned locale on `cmd`.
pub fn pin(cmd: &mut Command, locale: &str) {
    for var in PINNED_VARS {
        cmd.env(var, locale);
    }
    for var in CLEARED_VARS {
        cmd.env_remove(var);
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    fn env_of<'a>(cmd: &'a Command, key: &str) -> Option<Option<&'a OsStr>> {
        cmd.get_envs()
            .find(|(name, _)| *name == OsStr::new(key))
            .map(|(_, value)| value)
    }

    #[test]
    fn pins_lang_and_lc_all() {
        let mut cmd = Command::new("true");
        pin(&mut cmd, "C");
        assert_eq!(env_of(&cmd, "LANG"), Some(Some(OsStr::new("C"))));
        assert_eq!(env_of(&cmd, "LC_ALL"), Some(Some(OsStr::new("C"))));
        assert_eq!(env_of(&cmd, "LANGUAGE"), Some(None));
    }

    #[test]
    fn rejects_malformed_locale() {
        assert!(validate("C").is_ok());
        assert!(validate("en_US.UTF-8").is_ok());
        assert!(validate("").is_err());
        assert!(validate("LANG=C").is_err());
    }
}
