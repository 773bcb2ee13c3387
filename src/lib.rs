//! quotabar - Usage snapshot engine for a provider quota widget
//!
//! Polls an external service command for usage snapshots (Codex, Claude,
//! Gemini, etc.), normalizes them into typed per-provider state, and
//! publishes presentation-ready values for a status widget front end.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod core;
pub mod error;
pub mod storage;

/// Test utilities module - included in test builds or when test-utils feature is enabled.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{QuotabarError, Result};

// Re-export test utilities for external test crates
#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::*;
