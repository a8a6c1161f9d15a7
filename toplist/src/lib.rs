//! Bulk regression-test driver for a recursive link checker.
//!
//! A run loads a corpus of top-ranked site URLs, visits them in a fresh
//! random order and invokes the external checker once per URL with a
//! recursion depth of one. Output lands in two append-only logs:
//!
//! - **info log**: `Checking <url>` headers interleaved with checker stdout.
//! - **diagnostic log**: the same headers interleaved with checker stderr.
//!
//! The orchestration ([`driver`]) is kept apart from side effects: the
//! [`checker::Checker`] trait isolates process execution so the loop can be
//! exercised with scripted checkers in tests.

pub mod checker;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod exit_codes;
pub mod locale;
pub mod logging;
pub mod logs;
pub mod order;
pub mod process;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
