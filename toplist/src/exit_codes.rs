//! Stable exit codes for the `toplist` binary.

/// Every corpus entry was visited. Per-URL checker failures do not change this.
pub const OK: i32 = 0;
/// Fatal setup error (unreadable corpus, invalid config, unwritable logs).
pub const INVALID: i32 = 1;
/// Command-line usage error, as reported by clap.
pub const USAGE: i32 = 2;
