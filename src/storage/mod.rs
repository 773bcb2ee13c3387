//! Configuration storage.

pub mod config;
pub mod paths;

pub use config::{
    CliConfig, ConfigSource, ConfigSources, DEFAULT_REFRESH_SECONDS, DEFAULT_SERVICE_COMMAND, ENV_CONFIG,
    ENV_REFRESH_SECONDS, ENV_SERVICE_COMMAND, ENV_THEME, EnvConfig, FileConfig, MIN_REFRESH_SECONDS,
    ResolvedConfig,
};
pub use paths::AppPaths;
