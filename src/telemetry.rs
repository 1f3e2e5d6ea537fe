use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` wins when set; otherwise `level` applies. Stdout stays free for
/// plan and JSON output.
pub fn init_telemetry(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!(level, json, "git-sweep telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the run's common attributes
pub fn create_sweep_span(operation: &str, remote: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "sweep",
        operation = operation,
        remote = remote,
        correlation.id = correlation_id,
    )
}
