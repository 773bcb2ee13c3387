//! Configuration loading and resolution.
//!
//! Settings come from, in decreasing precedence:
//! 1. CLI flags
//! 2. Environment variables
//! 3. `~/.config/quotabar/config.toml`
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `QUOTABAR_SERVICE_COMMAND`: Snapshot command override
//! - `QUOTABAR_REFRESH_SECONDS`: Refresh interval in seconds
//! - `QUOTABAR_THEME`: `dark` or `light`
//! - `QUOTABAR_CONFIG`: Override config file path

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::paths::AppPaths;
use crate::core::metrics::Theme;
use crate::error::{QuotabarError, Result};

/// Environment variable for the snapshot command.
pub const ENV_SERVICE_COMMAND: &str = "QUOTABAR_SERVICE_COMMAND";
/// Environment variable for the refresh interval in seconds.
pub const ENV_REFRESH_SECONDS: &str = "QUOTABAR_REFRESH_SECONDS";
/// Environment variable for the color theme.
pub const ENV_THEME: &str = "QUOTABAR_THEME";
/// Environment variable overriding the config file path.
pub const ENV_CONFIG: &str = "QUOTABAR_CONFIG";

/// Default snapshot command when none is configured.
pub const DEFAULT_SERVICE_COMMAND: &str =
    "codexbar-service snapshot --from-codexbar-cli --provider all --status";
/// Default refresh interval.
pub const DEFAULT_REFRESH_SECONDS: u64 = 60;
/// Floor for the refresh interval, applied regardless of configuration.
pub const MIN_REFRESH_SECONDS: u64 = 15;
/// Default service command timeout.
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 30;

// =============================================================================
// Raw sources
// =============================================================================

/// Config file shape. Every field optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub service_command: Option<String>,
    pub refresh_seconds: Option<f64>,
    pub command_timeout_seconds: Option<u64>,
    pub theme: Option<String>,
}

impl FileConfig {
    /// Load from the given path; a missing file is an empty config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParse` when the file exists but is not valid TOML.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| QuotabarError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from the default location, respecting `QUOTABAR_CONFIG`.
    ///
    /// # Errors
    ///
    /// See [`FileConfig::load_from`].
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            Self::load_from(Path::new(&path))
        } else {
            Self::load_from(&AppPaths::new().config_file())
        }
    }
}

/// Environment variable overrides.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub service_command: Option<String>,
    pub refresh_seconds: Option<f64>,
    pub theme: Option<String>,
}

impl EnvConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            service_command: non_empty(ENV_SERVICE_COMMAND),
            refresh_seconds: non_empty(ENV_REFRESH_SECONDS).and_then(|v| v.parse().ok()),
            theme: non_empty(ENV_THEME),
        }
    }
}

/// CLI flag overrides (highest precedence).
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub service_command: Option<String>,
    pub refresh_seconds: Option<f64>,
    pub theme: Option<String>,
}

// =============================================================================
// Resolution
// =============================================================================

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

/// Source of each resolved setting, for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigSources {
    pub service_command: ConfigSource,
    pub refresh_seconds: ConfigSource,
    pub theme: ConfigSource,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Snapshot command string, never empty.
    pub service_command: String,
    /// Refresh interval, clamped to at least [`MIN_REFRESH_SECONDS`].
    pub refresh_interval: Duration,
    /// Service command timeout.
    pub command_timeout: Duration,
    /// Widget color theme.
    pub theme: Theme,
    pub sources: ConfigSources,
}

impl ResolvedConfig {
    /// Resolve from explicit parts; pure, for testability.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for an unrecognized theme name.
    pub fn from_parts(cli: &CliConfig, env: &EnvConfig, file: &FileConfig) -> Result<Self> {
        let mut sources = ConfigSources::default();

        let service_command = pick(
            &mut sources.service_command,
            cli.service_command.as_deref(),
            env.service_command.as_deref(),
            file.service_command.as_deref(),
        )
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SERVICE_COMMAND)
        .to_string();

        let refresh_raw = pick(
            &mut sources.refresh_seconds,
            cli.refresh_seconds,
            env.refresh_seconds,
            file.refresh_seconds,
        );
        let refresh_interval = Duration::from_secs(clamp_refresh_seconds(refresh_raw));

        let theme = pick(
            &mut sources.theme,
            cli.theme.as_deref(),
            env.theme.as_deref(),
            file.theme.as_deref(),
        )
        .map_or(Ok(Theme::Dark), parse_theme)?;

        let command_timeout = Duration::from_secs(
            file.command_timeout_seconds
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS)
                .max(1),
        );

        Ok(Self {
            service_command,
            refresh_interval,
            command_timeout,
            theme,
            sources,
        })
    }

    /// Resolve from the process environment and default config file.
    ///
    /// # Errors
    ///
    /// Config file parse errors and invalid values propagate.
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = FileConfig::load()?;
        Self::from_parts(cli, &EnvConfig::from_env(), &file)
    }
}

fn pick<T>(source: &mut ConfigSource, cli: Option<T>, env: Option<T>, file: Option<T>) -> Option<T> {
    if let Some(value) = cli {
        *source = ConfigSource::Cli;
        return Some(value);
    }
    if let Some(value) = env {
        *source = ConfigSource::Env;
        return Some(value);
    }
    if let Some(value) = file {
        *source = ConfigSource::ConfigFile;
        return Some(value);
    }
    *source = ConfigSource::Default;
    None
}

/// Absent or non-finite values fall back to the default; everything else is
/// floored at [`MIN_REFRESH_SECONDS`].
#[must_use]
pub fn clamp_refresh_seconds(raw: Option<f64>) -> u64 {
    let Some(seconds) = raw.filter(|s| s.is_finite()) else {
        return DEFAULT_REFRESH_SECONDS;
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let seconds = seconds.round().max(0.0) as u64;
    seconds.max(MIN_REFRESH_SECONDS)
}

fn parse_theme(raw: &str) -> Result<Theme> {
    match raw.to_lowercase().as_str() {
        "dark" => Ok(Theme::Dark),
        "light" => Ok(Theme::Light),
        other => Err(QuotabarError::ConfigInvalid {
            key: "theme".to_string(),
            message: format!("expected 'dark' or 'light', got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_configured() {
        let resolved = ResolvedConfig::from_parts(
            &CliConfig::default(),
            &EnvConfig::default(),
            &FileConfig::default(),
        )
        .unwrap();

        assert_eq!(resolved.service_command, DEFAULT_SERVICE_COMMAND);
        assert_eq!(resolved.refresh_interval, Duration::from_secs(60));
        assert_eq!(resolved.command_timeout, Duration::from_secs(30));
        assert_eq!(resolved.theme, Theme::Dark);
        assert_eq!(resolved.sources.service_command, ConfigSource::Default);
    }

    #[test]
    fn precedence_is_cli_env_file() {
        let cli = CliConfig {
            service_command: Some("from-cli".to_string()),
            ..CliConfig::default()
        };
        let env = EnvConfig {
            service_command: Some("from-env".to_string()),
            refresh_seconds: Some(120.0),
            theme: None,
        };
        let file = FileConfig {
            service_command: Some("from-file".to_string()),
            refresh_seconds: Some(300.0),
            command_timeout_seconds: None,
            theme: Some("light".to_string()),
        };

        let resolved = ResolvedConfig::from_parts(&cli, &env, &file).unwrap();
        assert_eq!(resolved.service_command, "from-cli");
        assert_eq!(resolved.sources.service_command, ConfigSource::Cli);
        assert_eq!(resolved.refresh_interval, Duration::from_secs(120));
        assert_eq!(resolved.sources.refresh_seconds, ConfigSource::Env);
        assert_eq!(resolved.theme, Theme::Light);
        assert_eq!(resolved.sources.theme, ConfigSource::ConfigFile);
    }

    #[test]
    fn empty_service_command_uses_default() {
        let cli = CliConfig {
            service_command: Some("   ".to_string()),
            ..CliConfig::default()
        };
        let resolved =
            ResolvedConfig::from_parts(&cli, &EnvConfig::default(), &FileConfig::default())
                .unwrap();
        assert_eq!(resolved.service_command, DEFAULT_SERVICE_COMMAND);
    }

    #[test]
    fn refresh_seconds_clamping() {
        assert_eq!(clamp_refresh_seconds(None), 60);
        assert_eq!(clamp_refresh_seconds(Some(f64::NAN)), 60);
        assert_eq!(clamp_refresh_seconds(Some(f64::INFINITY)), 60);
        assert_eq!(clamp_refresh_seconds(Some(5.0)), 15);
        assert_eq!(clamp_refresh_seconds(Some(-10.0)), 15);
        assert_eq!(clamp_refresh_seconds(Some(0.0)), 15);
        assert_eq!(clamp_refresh_seconds(Some(90.4)), 90);
    }

    #[test]
    fn invalid_theme_is_rejected() {
        let cli = CliConfig {
            theme: Some("solarized".to_string()),
            ..CliConfig::default()
        };
        let err = ResolvedConfig::from_parts(&cli, &EnvConfig::default(), &FileConfig::default())
            .unwrap_err();
        assert!(matches!(err, QuotabarError::ConfigInvalid { .. }));
    }

    #[test]
    fn file_config_loads_and_ignores_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "service_command = \"mysvc snapshot\"\nrefresh_seconds = 30\nfuture_key = true\n",
        )
        .unwrap();

        let file = FileConfig::load_from(&path).unwrap();
        assert_eq!(file.service_command.as_deref(), Some("mysvc snapshot"));
        assert_eq!(file.refresh_seconds, Some(30.0));
    }

    #[test]
    fn missing_file_is_empty_config() {
        let file = FileConfig::load_from(Path::new("/nonexistent/quotabar.toml")).unwrap();
        assert!(file.service_command.is_none());
    }

    #[test]
    fn broken_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "refresh_seconds = [oops").unwrap();

        assert!(matches!(
            FileConfig::load_from(&path),
            Err(QuotabarError::ConfigParse { .. })
        ));
    }
}
