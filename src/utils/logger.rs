//! Logging setup for the graph_slam binaries

use tracing::Level;

/// Initialize the tracing subscriber at INFO level.
///
/// The level can be overridden through `RUST_LOG`, e.g.
/// `RUST_LOG=graph_slam=debug` to see per-stage diagnostics.
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logger_with_level(default_level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
}
