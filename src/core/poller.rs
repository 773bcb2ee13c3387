//! Refresh scheduling and service command execution.
//!
//! One refresh cycle runs `Idle -> Running -> {Success, Failure} -> Idle`.
//! The snapshot channel executes the configured command through `sh -c`,
//! captures stdout and stderr separately, and publishes exactly one outcome
//! to the session. A generation counter makes overlapping refreshes safe:
//! triggering a refresh while one is outstanding supersedes it, so only the
//! newest result can ever mutate session state. Exit status does not
//! participate in success/failure classification (the command interface does
//! not expose it to the widget); it is logged at debug level only.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{MissedTickBehavior, interval, timeout};

use crate::core::session::Session;
use crate::core::snapshot::WidgetSnapshot;
use crate::error::{QuotabarError, Result};

/// Default timeout for the service command. A hung command would otherwise
/// stall the refresh channel indefinitely.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured output of one service command run.
#[derive(Debug)]
struct CommandOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// Scheduler for the snapshot refresh channel.
#[derive(Debug)]
pub struct Poller {
    session: Arc<Session>,
    command: String,
    command_timeout: Duration,
    generation: AtomicU64,
}

impl Poller {
    #[must_use]
    pub fn new(session: Arc<Session>, command: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            session,
            command: command.into(),
            command_timeout,
            generation: AtomicU64::new(0),
        }
    }

    /// The command string this poller runs.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Claim the next refresh generation, superseding any outstanding one.
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a refresh outcome unless it was superseded or the session is
    /// shutting down. Returns whether the outcome was applied.
    fn commit(&self, generation: u64, outcome: Result<WidgetSnapshot>) -> bool {
        if generation != self.generation.load(Ordering::SeqCst) {
            tracing::debug!(generation, "discarding superseded refresh result");
            return false;
        }
        if self.session.is_shutting_down() {
            tracing::debug!("discarding refresh result after shutdown");
            return false;
        }

        match outcome {
            Ok(snapshot) => {
                tracing::debug!(entries = snapshot.entries.len(), "refresh succeeded");
                self.session.apply_snapshot(snapshot);
            }
            Err(error) => {
                tracing::warn!(error = %error, "refresh failed");
                self.session.apply_error(&error);
            }
        }
        true
    }

    /// Run one refresh cycle and publish its outcome.
    pub async fn refresh(&self) {
        if self.session.is_shutting_down() {
            return;
        }

        let generation = self.next_generation();
        let outcome = self.fetch_snapshot().await;
        self.commit(generation, outcome);
    }

    async fn fetch_snapshot(&self) -> Result<WidgetSnapshot> {
        let output = run_service_command(&self.command, self.command_timeout).await?;

        if output.exit_code != 0 {
            tracing::debug!(exit_code = output.exit_code, "service command exit status");
        }

        if output.stdout.trim().is_empty() {
            let stderr = output.stderr.trim();
            return Err(QuotabarError::NoOutput {
                stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
            });
        }

        WidgetSnapshot::normalize(&output.stdout)
    }

    /// Drive the recurring refresh loop until shutdown. Ticks immediately at
    /// startup, then at the given interval; each tick spawns a refresh so a
    /// slow command never blocks the ticker (the generation counter keeps
    /// late results from overwriting newer ones).
    pub async fn run(self: Arc<Self>, refresh_interval: Duration) {
        let mut revisions = self.session.subscribe();
        let mut ticker = interval(refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.session.is_shutting_down() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let poller = Arc::clone(&self);
                    tokio::spawn(async move { poller.refresh().await });
                }
                changed = revisions.changed() => {
                    if changed.is_err() || self.session.is_shutting_down() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("refresh loop stopped");
    }
}

/// Execute one shell command, capturing stdout and stderr separately.
///
/// The streams are read concurrently; reading them one after the other can
/// deadlock once the child fills the pipe buffer of the stream not being
/// read. On timeout the child is killed and the transport handle released.
async fn run_service_command(command: &str, timeout_duration: Duration) -> Result<CommandOutput> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| QuotabarError::Spawn {
            reason: e.to_string(),
        })?;

    let result = timeout(timeout_duration, async {
        let stdout_handle = async {
            let mut stdout = String::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_string(&mut stdout).await?;
            }
            Ok::<_, std::io::Error>(stdout)
        };

        let stderr_handle = async {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                err.read_to_string(&mut stderr).await?;
            }
            Ok::<_, std::io::Error>(stderr)
        };

        let (stdout_result, stderr_result) = tokio::join!(stdout_handle, stderr_handle);
        let stdout = stdout_result?;
        let stderr = stderr_result?;
        let status = child.wait().await?;

        Ok::<_, std::io::Error>(CommandOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
        })
    })
    .await;

    match result {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(QuotabarError::Spawn {
            reason: e.to_string(),
        }),
        Err(_) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            Err(QuotabarError::TimedOut {
                seconds: timeout_duration.as_secs(),
            })
        }
    }
}
