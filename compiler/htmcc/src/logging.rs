//! Diagnostic logging setup.
//!
//! Logs always go to stderr so they never mix with page output on stdout.
//! `RUST_LOG`, when set, overrides the level chosen on the command line.

use std::fmt;
use std::str::FromStr;
use std::sync::Once;

use tracing::level_filters::LevelFilter;

static LOGGING_INIT: Once = Once::new();

/// Level names accepted by `-ll/--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    All,
    #[default]
    Info,
    Warning,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            Self::All => LevelFilter::TRACE,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
            Self::Off => LevelFilter::OFF,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized log level '{0}' (expected all, info, warning, error, or off)")]
pub struct UnknownLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "off" => Ok(Self::Off),
            other => Err(UnknownLogLevel(other.to_string())),
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(level: LogLevel) {
    LOGGING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::builder()
            .with_default_directive(level.as_filter().into())
            .from_env_lossy();
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true)
                    .without_time(),
            )
            .with(filter)
            .try_init();
    });
}
