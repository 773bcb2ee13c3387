//! Test utilities for quotabar.
//!
//! Provides shared test data factories and a temp-dir helper for use across
//! unit and integration tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quotabar::test_utils::*;
//!
//! let window = make_test_window(30.0);
//! let snapshot = make_test_snapshot(&["codex", "claude"]);
//! let dir = TestDir::new();
//! dir.create_file("config.toml", "refresh_seconds = 45");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::snapshot::{
    IdentityInfo, ProviderEntry, StatusInfo, UsageWindow, WidgetSnapshot, now_timestamp,
};

// =============================================================================
// Test Data Factories
// =============================================================================

/// Create a test `UsageWindow` with the given usage percentage.
///
/// The window is configured with realistic values: a 5-hour duration and a
/// fixed reset timestamp.
#[must_use]
pub fn make_test_window(used_percent: f64) -> UsageWindow {
    UsageWindow {
        used_percent: Some(used_percent),
        window_minutes: Some(300.0),
        resets_at: Some("2026-02-11T20:00:00Z".to_string()),
    }
}

/// Create a test `UsageWindow` with only the usage percentage set.
///
/// Useful for exercising code that must handle missing optional fields.
#[must_use]
pub fn make_test_window_minimal(used_percent: f64) -> UsageWindow {
    UsageWindow {
        used_percent: Some(used_percent),
        ..UsageWindow::default()
    }
}

/// Create a test `ProviderEntry` with primary and secondary windows and
/// realistic identity data.
#[must_use]
pub fn make_test_entry(provider: &str) -> ProviderEntry {
    ProviderEntry {
        provider: provider.to_string(),
        source: "cli".to_string(),
        updated_at: now_timestamp(),
        primary: Some(make_test_window(28.0)),
        secondary: Some(UsageWindow {
            used_percent: Some(45.0),
            window_minutes: Some(10080.0),
            resets_at: Some("2026-02-14T20:00:00Z".to_string()),
        }),
        tertiary: None,
        credits_remaining: None,
        code_review_remaining_percent: None,
        identity: Some(IdentityInfo {
            account_email: Some(format!("{provider}@example.com")),
            account_organization: None,
            login_method: Some("oauth".to_string()),
        }),
        status: Some(StatusInfo {
            indicator: Some("none".to_string()),
            description: Some("Operational".to_string()),
            updated_at: Some(now_timestamp()),
            url: Some("https://status.example.com/".to_string()),
        }),
    }
}

/// Create a test `ProviderEntry` with nothing but the provider id.
#[must_use]
pub fn make_test_entry_minimal(provider: &str) -> ProviderEntry {
    ProviderEntry::empty(provider)
}

/// Create a test `WidgetSnapshot` with one full entry per listed provider.
#[must_use]
pub fn make_test_snapshot(providers: &[&str]) -> WidgetSnapshot {
    WidgetSnapshot {
        generated_at: now_timestamp(),
        enabled_providers: providers.iter().map(|p| (*p).to_string()).collect(),
        entries: providers.iter().map(|p| make_test_entry(p)).collect(),
    }
}

/// Serialize a test snapshot to the JSON the service command would print.
#[must_use]
pub fn make_test_snapshot_json(providers: &[&str]) -> String {
    serde_json::to_string(&make_test_snapshot(providers))
        .unwrap_or_else(|e| panic!("snapshot serialization failed: {e}"))
}

// =============================================================================
// Filesystem Helpers
// =============================================================================

/// Temporary directory scoped to a test, removed on drop.
pub struct TestDir {
    dir: tempfile::TempDir,
}

impl TestDir {
    /// Create a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir creation failed: {e}")),
        }
    }

    /// Path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file with the given relative name and content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.file_path(name);
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write {} failed: {e}", path.display()));
    }

    /// Absolute path for a file inside the directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
