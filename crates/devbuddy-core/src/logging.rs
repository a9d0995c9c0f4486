use tracing_subscriber::EnvFilter;

/// Install the process-wide structured logger.
///
/// Honors `RUST_LOG` and always enables `INFO`. Calling it again after a
/// subscriber is installed is a no-op.
pub fn init() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .try_init();

    if result.is_ok() {
        tracing::info!("Logging initialized");
    }
}
