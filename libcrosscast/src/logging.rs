//! Logging setup shared by the Crosscast binaries.
//!
//! Both binaries log to stderr through `tracing`; stdout stays
//! reserved for command output. The format comes from
//! `CROSSCAST_LOG_FORMAT` and the filter from `RUST_LOG`, falling
//! back to the binary's default level (or debug with `--verbose`).

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Output format for the stderr log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain text, suitable for piping.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// Multi-line colored output for development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!(
                "unknown log format '{}'. Valid options: text, json, pretty",
                other
            )),
        }
    }
}

pub struct LoggingConfig {
    format: LogFormat,
    level: String,
    verbose: bool,
}

impl LoggingConfig {
    /// Build a config from the environment. `level` is the filter used
    /// when `RUST_LOG` is unset; `verbose` overrides it with debug.
    pub fn from_env(level: &str, verbose: bool) -> Self {
        let format = std::env::var("CROSSCAST_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        Self {
            format,
            level: level.to_string(),
            verbose,
        }
    }

    /// Install the global subscriber. Call once, at startup.
    pub fn init(self) {
        let fallback = if self.verbose { "debug" } else { self.level.as_str() };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match self.format {
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
            LogFormat::Text => builder.with_target(false).init(),
        }
    }
}
