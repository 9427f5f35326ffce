use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `debug` turns on this crate's
/// diagnostics (constructed URLs, raw manifest bodies, underlying errors) and
/// everything else stays at `warn`.
pub fn init(debug: bool) {
    let fallback = if debug { "warn,cosup=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
