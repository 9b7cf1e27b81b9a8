//! Structured logging initialization: level parsing plus a json/pretty
//! layer switch. The bridge has no secrets to scrub from its log output
//! beyond the registry token/credentials, which are never logged in the
//! first place — they live only in [`crate::domain::models::BridgeConfig`]
//! and request headers.

use anyhow::{bail, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::domain::models::BridgeConfig;

/// Initialize the global `tracing` subscriber from `config.log_level` /
/// `config.log_format`. Must be called exactly once, before any other
/// component logs.
pub fn init(config: &BridgeConfig) -> Result<()> {
    let default_level = parse_log_level(&config.log_level)?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    match config.log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_filter(env_filter),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_filter(env_filter),
                )
                .init();
        }
    }

    tracing::info!(
        level = %config.log_level,
        format = %config.log_format,
        "logger initialized"
    );
    Ok(())
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => bail!("invalid log level: {other}"),
    }
}
