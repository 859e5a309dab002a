use facade_watcher::LogLevel;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to stderr at the requested verbosity. `RUST_LOG`
/// is only consulted when it is set.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
