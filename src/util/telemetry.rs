//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set.
///
/// Filtering follows `RUST_LOG`; scheduler plan construction and group
/// notifications log at `debug`, run summaries at `info`.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Like [`init_tracing`], falling back to `default_directive` when `RUST_LOG`
/// is unset or unparsable.
pub fn init_tracing_with_default(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
