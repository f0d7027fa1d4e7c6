use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness capture.
///
/// `RUST_LOG` overrides the default `info` filter. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
