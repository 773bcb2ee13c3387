//! quotabar - Usage snapshot engine for a provider quota widget
//!
//! CLI entry point. Runs the polling engine and streams published widget
//! state as JSON lines on stdout, one line per state revision.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde::Serialize;

use quotabar::core::actions::ActionDispatcher;
use quotabar::core::logging;
use quotabar::core::metrics::{self, Severity, Theme};
use quotabar::core::poller::Poller;
use quotabar::core::registry;
use quotabar::core::session::{PublishedState, Session};
use quotabar::core::snapshot::WidgetSnapshot;
use quotabar::storage::config::{CliConfig, ResolvedConfig};

#[derive(Parser, Debug)]
#[command(
    name = "quotabar",
    version,
    about = "Poll provider usage snapshots and publish widget state"
)]
struct Cli {
    /// Shell command that produces a usage snapshot on stdout
    #[arg(long, value_name = "CMD")]
    service_command: Option<String>,

    /// Seconds between refreshes (minimum 15)
    #[arg(long, value_name = "SECONDS")]
    refresh_seconds: Option<f64>,

    /// Color theme for severity colors (dark or light)
    #[arg(long, value_name = "THEME")]
    theme: Option<String>,

    /// Refresh once, print the published state, and exit
    #[arg(long)]
    once: bool,

    /// Pretty-print published state JSON
    #[arg(long)]
    pretty: bool,

    /// Print a built-in sample snapshot's published state and exit
    #[arg(long)]
    sample: bool,

    /// Refresh once, dispatch a provider action, and exit
    #[arg(long, value_enum, value_name = "ACTION")]
    action: Option<Action>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

/// User-invoked actions for the preferred provider.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Run the provider's login flow
    Login,
    /// Open the usage dashboard in the default browser
    Dashboard,
    /// Open the provider's status page
    Status,
}

impl Cli {
    fn config(&self) -> CliConfig {
        CliConfig {
            service_command: self.service_command.clone(),
            refresh_seconds: self.refresh_seconds,
            theme: self.theme.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> quotabar::Result<()> {
    let config = ResolvedConfig::resolve(&cli.config())?;
    tracing::debug!(
        command = %config.service_command,
        refresh_seconds = config.refresh_interval.as_secs(),
        "resolved configuration"
    );

    let session = Arc::new(Session::new());

    if cli.sample {
        session.apply_snapshot(WidgetSnapshot::sample());
        print_state(&session, config.theme, cli.pretty)?;
        return Ok(());
    }

    let poller = Arc::new(Poller::new(
        Arc::clone(&session),
        config.service_command.clone(),
        config.command_timeout,
    ));

    if let Some(action) = cli.action {
        poller.refresh().await;
        let dispatcher = ActionDispatcher::new(Arc::clone(&session));
        let launched = match action {
            Action::Login => dispatcher.run_account_action(),
            Action::Dashboard => dispatcher.open_usage_dashboard(),
            Action::Status => dispatcher.open_status_page(),
        };
        if !launched {
            tracing::info!(?action, "nothing to launch for this provider");
        }
        return Ok(());
    }

    if cli.once {
        poller.refresh().await;
        print_state(&session, config.theme, cli.pretty)?;
        return Ok(());
    }

    let mut revisions = session.subscribe();
    let engine = tokio::spawn(Arc::clone(&poller).run(config.refresh_interval));

    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                if session.is_shutting_down() {
                    break;
                }
                print_state(&session, config.theme, cli.pretty)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                session.shutdown();
                break;
            }
        }
    }

    // The poll loop observes the shutdown revision and exits on its own.
    let _ = tokio::time::timeout(Duration::from_secs(2), engine).await;
    Ok(())
}

/// Published state plus the derived presentation values for the provider
/// currently on display. This is the full payload a widget front end needs
/// per revision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmittedState {
    #[serde(flatten)]
    published: PublishedState,
    display: DisplayState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisplayState {
    provider: String,
    has_usage_data: bool,
    primary_used_percent: f64,
    primary_label: String,
    primary_color: String,
    secondary_used_percent: f64,
    secondary_label: String,
    reset_countdown: String,
    dashboard_url: String,
    status_page_url: String,
}

fn display_state(session: &Session, theme: Theme) -> DisplayState {
    let entry = session.display_entry();
    let now = Utc::now();
    DisplayState {
        provider: entry.provider.clone(),
        has_usage_data: metrics::has_any_usage_data(&entry),
        primary_used_percent: metrics::used_percent(entry.primary.as_ref()),
        primary_label: metrics::window_label(entry.primary.as_ref(), "session"),
        primary_color: Severity::of(entry.primary.as_ref()).color(theme).to_string(),
        secondary_used_percent: metrics::used_percent(entry.secondary.as_ref()),
        secondary_label: metrics::window_label(entry.secondary.as_ref(), "weekly"),
        reset_countdown: metrics::reset_countdown(entry.primary.as_ref(), now),
        dashboard_url: registry::dashboard_url_for(&entry.provider, &entry),
        status_page_url: registry::status_page_url_for(&entry.provider, &entry),
    }
}

fn print_state(session: &Session, theme: Theme, pretty: bool) -> quotabar::Result<()> {
    let state = EmittedState {
        published: session.published(),
        display: display_state(session, theme),
    };
    let line = if pretty {
        serde_json::to_string_pretty(&state)?
    } else {
        serde_json::to_string(&state)?
    };
    println!("{line}");
    Ok(())
}
