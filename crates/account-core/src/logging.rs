//! Tracing subscriber setup for applications embedding the account layer
//!
//! The library itself only emits `tracing` events (account changes at `info`,
//! rejected tokens at `warn`, store traffic at `debug`). Binaries that have no
//! subscriber of their own can install one with [`setup_logging`].

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{AccountError, Result};

/// Output options for [`setup_logging`]
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Baseline verbosity; `RUST_LOG` directives are layered on top
    pub level: Level,
    /// One JSON object per line instead of human-readable text
    pub json: bool,
    /// Source file and line of each event
    pub file_info: bool,
    /// Span enter/exit events
    pub log_spans: bool,
    /// Name reported in the startup line
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
            app_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }
}

/// Install a process-wide `fmt` subscriber.
///
/// Only one subscriber can ever be installed; later calls return
/// [`AccountError::Logging`] and leave the first one in place.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());
    let span_events = if config.log_spans { FmtSpan::ACTIVE } else { FmtSpan::NONE };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AccountError::Logging(e.to_string()))?;

    tracing::info!(
        "{} logging ready ({} v{})",
        config.app_name,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

/// Parse a level name such as `debug` or `WARN`
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| AccountError::Config(format!("Invalid log level: {}", level)))
}
