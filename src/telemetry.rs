use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

/// Daily rolling log at `<log_dir>/app.log`. Keep the returned guard alive
/// for as long as logs should be flushed.
pub fn init_tracing(log_dir: &str, level: tracing::Level) -> WorkerGuard {
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    guard
}
