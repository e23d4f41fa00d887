use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` decides the filter; without it the level is `info`, or `debug`
/// when `debug` is set.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
