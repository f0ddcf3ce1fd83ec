//! Logging setup for the IELTS prep AI services
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! human-readable or a JSON-lines fmt layer

use ielts_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;

/// Fallback directive used when the configured filter does not parse
const FALLBACK_FILTER: &str = "info";

/// Initialize logging from configuration
///
/// `RUST_LOG`, when set, takes precedence over the configured filter.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(&config.log_filter));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_target(true)
                .with_file(false)
                .with_line_number(false);

            registry.with(fmt_layer).try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            registry.with(fmt_layer).try_init()
        }
    };

    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Parse a filter directive, falling back to `info` when it is invalid
pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_directive_is_kept() {
        let filter = build_filter("debug,ielts_ai=trace");
        assert!(filter.to_string().contains("ielts_ai=trace"));
    }

    #[test]
    fn invalid_directive_falls_back_to_info() {
        let filter = build_filter("ielts_ai=loud");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn second_init_is_an_error() {
        let config = TelemetryConfig::default();
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}
