//! Structured logging setup
//!
//! Provides JSON-formatted and human-readable logging with optional file output.
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging based on configuration.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid, the log file cannot
/// be opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use toolgate::config::LoggingConfig;
/// use toolgate::logging::init_logging;
///
/// init_logging(&LoggingConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let file = match &config.file {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if config.json {
        let stdout_layer = fmt::layer().json().with_current_span(true);
        match file {
            Some(file) => {
                let file_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(file);
                registry.with(stdout_layer).with(file_layer).try_init()?;
            }
            None => registry.with(stdout_layer).try_init()?,
        }
    } else {
        let stdout_layer = fmt::layer().with_target(true).with_level(true);
        match file {
            Some(file) => {
                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(file);
                registry.with(stdout_layer).with(file_layer).try_init()?;
            }
            None => registry.with(stdout_layer).try_init()?,
        }
    }

    Ok(())
}
