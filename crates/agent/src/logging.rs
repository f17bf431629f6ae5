use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` writer to stderr, honoring `RUST_LOG` if
/// set and otherwise falling back to `level` (the agent's configured
/// `log_level`).
pub fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
