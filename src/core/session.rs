//! Process-lifetime session state and the provider selection policy.
//!
//! The session is the only mutable shared resource in the engine. All
//! mutation funnels through one lock, and a refresh result always updates
//! `snapshot` and `last_error` together so neither is ever stale relative
//! to the other. A `watch` revision channel tells the presentation boundary
//! when anything changed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use crate::core::snapshot::{DEFAULT_PROVIDER, ProviderEntry, WidgetSnapshot, normalize_provider_id};
use crate::error::QuotabarError;

/// Mutable session fields.
#[derive(Debug, Clone, Default)]
struct SessionState {
    snapshot: WidgetSnapshot,
    last_error: String,
    selected_provider: String,
    is_shutting_down: bool,
}

/// Immutable view of the session published to the presentation boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedState {
    pub snapshot: WidgetSnapshot,
    pub last_error: String,
    pub selected_provider: String,
    pub is_shutting_down: bool,
}

/// The state owner. Constructed at startup and shared by reference with the
/// poller and the action dispatcher; no ambient globals.
#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionState>,
    revision: watch::Sender<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Mutex::new(SessionState::default()),
            revision,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Subscribe to state revisions; the receiver wakes on every publish.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Replace the snapshot and clear the last error, as one atomic update.
    ///
    /// The first snapshot that arrives while no provider is selected pins
    /// the selection: the "codex" entry if present, else the first entry's
    /// provider, else "codex".
    pub fn apply_snapshot(&self, snapshot: WidgetSnapshot) {
        {
            let mut state = self.lock();
            if state.is_shutting_down {
                return;
            }
            if state.selected_provider.is_empty() {
                state.selected_provider = initial_selection(&snapshot);
            }
            state.snapshot = snapshot;
            state.last_error.clear();
        }
        self.bump_revision();
    }

    /// Record a refresh failure: empty snapshot plus the error's message,
    /// as one atomic update. Selection is untouched.
    pub fn apply_error(&self, error: &QuotabarError) {
        {
            let mut state = self.lock();
            if state.is_shutting_down {
                return;
            }
            state.snapshot = WidgetSnapshot::default();
            state.last_error = error.session_message();
        }
        self.bump_revision();
    }

    /// Explicit provider selection. The only way selection changes once set.
    pub fn select_provider(&self, provider_id: &str) {
        {
            let mut state = self.lock();
            state.selected_provider = normalize_provider_id(provider_id);
        }
        self.bump_revision();
    }

    /// Flip the monotonic shutdown flag. Gates further scheduling, process
    /// launches, and late-arriving refresh results.
    pub fn shutdown(&self) {
        {
            let mut state = self.lock();
            state.is_shutting_down = true;
        }
        self.bump_revision();
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.lock().is_shutting_down
    }

    #[must_use]
    pub fn last_error(&self) -> String {
        self.lock().last_error.clone()
    }

    #[must_use]
    pub fn selected_provider(&self) -> String {
        self.lock().selected_provider.clone()
    }

    /// The effective provider to display right now: the explicit selection
    /// if set, else first-codex-else-first from the snapshot's entries, else
    /// first-codex-else-first from `enabled_providers`, else "codex".
    #[must_use]
    pub fn preferred_provider_id(&self) -> String {
        let state = self.lock();
        if !state.selected_provider.is_empty() {
            return state.selected_provider.clone();
        }

        let entry_ids = state.snapshot.entries.iter().map(|e| e.provider.as_str());
        if let Some(id) = first_codex_else_first(entry_ids) {
            return id;
        }

        let enabled_ids = state.snapshot.enabled_providers.iter().map(String::as_str);
        first_codex_else_first(enabled_ids).unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
    }

    /// The entry for the preferred provider, synthesized all-empty when the
    /// snapshot has no matching entry. Presentation code never sees absence.
    #[must_use]
    pub fn display_entry(&self) -> ProviderEntry {
        let preferred = self.preferred_provider_id();
        let state = self.lock();
        state
            .snapshot
            .entry_for(&preferred)
            .cloned()
            .unwrap_or_else(|| ProviderEntry::empty(&preferred))
    }

    /// Snapshot of everything the presentation boundary may read.
    #[must_use]
    pub fn published(&self) -> PublishedState {
        let state = self.lock();
        PublishedState {
            snapshot: state.snapshot.clone(),
            last_error: state.last_error.clone(),
            selected_provider: state.selected_provider.clone(),
            is_shutting_down: state.is_shutting_down,
        }
    }
}

fn initial_selection(snapshot: &WidgetSnapshot) -> String {
    first_codex_else_first(snapshot.entries.iter().map(|e| e.provider.as_str()))
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
}

fn first_codex_else_first<'a>(ids: impl Iterator<Item = &'a str> + Clone) -> Option<String> {
    if ids.clone().any(|id| id == DEFAULT_PROVIDER) {
        return Some(DEFAULT_PROVIDER.to_string());
    }
    ids.clone().next().map(ToString::to_string)
}
