//! Tracing subscriber setup for binaries and tests that embed the runner.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter directives.
pub const LOG_ENV_VAR: &str = "HUBLINE_LOG";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("unknown log format `{0}` (expected text or json)")]
    Format(String),
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(LogError::Format(other.to_string())),
        }
    }
}

/// Build a filter from directives such as `info` or `hubline_core=debug`.
pub fn build_filter(directives: &str) -> Result<EnvFilter, LogError> {
    Ok(EnvFilter::try_new(directives)?)
}

/// Install the global fmt subscriber.
///
/// `HUBLINE_LOG`, when set, replaces `level`. Fails instead of panicking if
/// a subscriber is already installed.
pub fn init_tracing(level: &str, format: &str) -> Result<(), LogError> {
    let directives = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| level.to_string());
    let filter = build_filter(&directives)?;

    let installed = match format.parse::<LogFormat>()? {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    installed.map_err(|err| LogError::AlreadyInstalled(err.to_string()))
}
