use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,parkcast=debug";

/// Initialize logging for a job.
/// - RUST_LOG respected; default to "info,parkcast=debug"
/// - `json` selects one JSON object per line instead of the human format
/// - written to stderr, stdout is left for command output
pub fn init(service_name: &str, json: bool) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().compact().with_writer(std::io::stderr)))
        .init();

    tracing::info!(service = %service_name, "Logging initialized");
}
