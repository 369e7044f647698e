pub mod entities;

// Re-export tracing for use in this crate
pub use tracing;

/// Installs the global tracing subscriber.
///
/// The log level is controlled via the `RUST_LOG` environment variable and
/// falls back to `default_filter` when it is unset or invalid.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // `try_init` so tests and embedding binaries can call this more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}
