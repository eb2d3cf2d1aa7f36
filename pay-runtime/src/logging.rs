//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack for the purchase core:
//! pretty/JSON/compact output, `EnvFilter`-based module filtering and a
//! default level for when `RUST_LOG` is unset.
//!
//! ## Usage
//!
//! ```no_run
//! use pay_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default().with_format(LogFormat::Compact);
//! init_logging(config).expect("failed to initialize logging");
//!
//! tracing::info!("purchase core started");
//! ```

use tracing_subscriber::{
    filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::{Error, Result};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Default level applied when no filter directives are given.
    pub default_level: tracing::Level,
    /// Explicit filter directives (overrides `RUST_LOG` and `default_level`).
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_level: tracing::Level::INFO,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.env_filter = Some(directives.into());
        self
    }
}

/// Initializes the global `tracing` subscriber.
///
/// Filter resolution order: explicit directives from the config, then the
/// `RUST_LOG` environment variable, then the config's default level.
///
/// # Errors
///
/// Returns [`Error::Config`] when the filter directives are invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = match &config.env_filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| Error::Config(format!("invalid filter directives: {e}")))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string())),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("failed to install subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_pretty_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.default_level, tracing::Level::INFO);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn builder_overrides_apply() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(tracing::Level::DEBUG)
            .with_env_filter("core_purchase=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.default_level, tracing::Level::DEBUG);
        assert_eq!(config.env_filter.as_deref(), Some("core_purchase=trace"));
    }

    #[test]
    fn invalid_filter_directives_are_rejected() {
        let config = LoggingConfig::default().with_env_filter("core_purchase=info=extra");
        assert!(matches!(init_logging(config), Err(Error::Config(_))));
    }
}
