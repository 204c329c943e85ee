use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ApiConfig, Environment};

/// Install the global subscriber for the API process.
///
/// `RUST_LOG` wins over the configured `LOG_LEVEL`. Production emits one JSON object
/// per event with the request span attached, so a prediction can be traced by its
/// `request_id`. actix's access log arrives through the `log` bridge.
pub fn setup_logging(config: &ApiConfig) -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(rust_log.as_deref(), &config.log_level)?;

    let (json, pretty) = match config.environment {
        Environment::Production => (
            Some(fmt::layer().json().with_current_span(true).with_span_list(false)),
            None,
        ),
        Environment::Development => (None, Some(fmt::layer().pretty())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
        .context("a global tracing subscriber is already installed")
}

fn build_filter(rust_log: Option<&str>, log_level: &str) -> anyhow::Result<EnvFilter> {
    let directives = rust_log.filter(|s| !s.trim().is_empty()).unwrap_or(log_level);
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log filter `{directives}`"))
}
