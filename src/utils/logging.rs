//! Tracing subscriber setup.
//!
//! Logs are written to stderr so that agent responses on stdout stay clean
//! when the CLI is piped. `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one event per line
    Text,
    /// Structured JSON lines for log aggregation
    Json,
}

impl LogFormat {
    pub fn from_flag(json: bool) -> Self {
        if json { LogFormat::Json } else { LogFormat::Text }
    }
}

/// Build the filter used by [`init`].
///
/// Noisy HTTP internals are capped at `warn` unless `RUST_LOG` says otherwise.
pub fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directives = format!("{},hyper=warn,reqwest=warn,rustls=warn,rmcp=warn", level);
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(level: &str, format: LogFormat) {
    let filter = build_filter(level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
