use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes tracing with a human-readable console layer and a rolling
/// JSON file under `logs/`.
///
/// Console output goes to stderr so the report lines the CLI prints on
/// stdout stay clean when piped.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    // Daily rotation; the non-blocking writer guard must outlive the program
    // so the last buffered lines are flushed.
    let file_appender = tracing_appender::rolling::daily("logs", "crm_migrate.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(file_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("crm_migrate=info".parse().unwrap()))
        .with(file_layer)
        .with(console_layer)
        .init();

    std::mem::forget(guard);
}
