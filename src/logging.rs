use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "jobboard=debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logs to stderr. Used by the one-shot commands.
pub fn init_stderr(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Logs to `jobboard.log` next to the store, since the board owns the
/// terminal. Keep the guard alive until exit or buffered lines are lost.
pub fn init_file(dir: &Path, verbose: bool) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(dir, "jobboard.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    guard
}
