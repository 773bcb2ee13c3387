//! Provider action dispatch: login flows, dashboards, status pages.
//!
//! The action channel is fire-and-forget and independent of the refresh
//! channel: launched processes are never awaited and their output is
//! discarded. An action with nothing to resolve is a silent no-op (the
//! presentation layer hides the control via capability checks), and every
//! action is refused once the session is shutting down.

use std::process::Stdio;
use std::sync::Arc;

use crate::core::registry::{self, LoginAction};
use crate::core::session::Session;

/// Terminal emulators probed in order for login commands, with the flag
/// that introduces the command to run. An empty flag means the command
/// follows the program directly.
const TERMINAL_LAUNCHERS: &[(&str, &str)] = &[
    ("x-terminal-emulator", "-e"),
    ("konsole", "-e"),
    ("gnome-terminal", "--"),
    ("kitty", ""),
    ("alacritty", "-e"),
    ("xterm", "-e"),
];

/// Dispatches user-invoked actions for the currently preferred provider.
#[derive(Debug)]
pub struct ActionDispatcher {
    session: Arc<Session>,
}

impl ActionDispatcher {
    #[must_use]
    pub const fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Run the preferred provider's login action: a terminal command in the
    /// first available emulator, or an externally opened URL. Returns
    /// whether a launch was requested.
    #[must_use]
    pub fn run_account_action(&self) -> bool {
        if self.session.is_shutting_down() {
            return false;
        }

        let provider_id = self.session.preferred_provider_id();
        match registry::login_action(&provider_id) {
            Some(LoginAction::Terminal(command)) => {
                tracing::info!(provider = %provider_id, command, "launching login command");
                launch_in_terminal(command)
            }
            Some(LoginAction::Url(url)) => {
                tracing::info!(provider = %provider_id, url, "opening login url");
                open_external(url)
            }
            None => false,
        }
    }

    /// Open the preferred provider's usage dashboard, honoring the paid-tier
    /// override. No-op when no URL resolves.
    #[must_use]
    pub fn open_usage_dashboard(&self) -> bool {
        if self.session.is_shutting_down() {
            return false;
        }

        let provider_id = self.session.preferred_provider_id();
        let entry = self.session.display_entry();
        open_external(&registry::dashboard_url_for(&provider_id, &entry))
    }

    /// Open the preferred provider's status page, preferring the URL from
    /// the entry's own status payload.
    #[must_use]
    pub fn open_status_page(&self) -> bool {
        if self.session.is_shutting_down() {
            return false;
        }

        let provider_id = self.session.preferred_provider_id();
        let entry = self.session.display_entry();
        open_external(&registry::status_page_url_for(&provider_id, &entry))
    }
}

fn open_external(url: &str) -> bool {
    if url.trim().is_empty() {
        return false;
    }
    match open::that(url) {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(url, error = %error, "failed to open url externally");
            false
        }
    }
}

/// Launch a command in the first available terminal emulator, falling back
/// to a bare non-interactive shell when none is installed.
fn launch_in_terminal(command: &str) -> bool {
    for (program, flag) in TERMINAL_LAUNCHERS {
        if which::which(program).is_err() {
            continue;
        }
        if spawn_detached(&terminal_invocation(program, flag, command)) {
            return true;
        }
    }

    tracing::debug!("no terminal emulator found, running non-interactively");
    spawn_detached(command)
}

/// Shell invocation for running `command` inside a terminal emulator. The
/// command text is single-quoted so the emulator's shell passes it to
/// `sh -c` intact.
fn terminal_invocation(program: &str, flag: &str, command: &str) -> String {
    let quoted = shell_quote(command);
    if flag.is_empty() {
        format!("{program} sh -c {quoted}")
    } else {
        format!("{program} {flag} sh -c {quoted}")
    }
}

/// Single-quote a string for the shell, escaping embedded single quotes.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// Spawn a shell command detached: output discarded, never awaited.
fn spawn_detached(shell_command: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(shell_command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .is_ok()
}
