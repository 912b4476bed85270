use tracing_subscriber::EnvFilter;

/// Initialise logging. `debug` comes from the settings file; only then may
/// `RUST_LOG` override the level, otherwise `info` is forced.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
