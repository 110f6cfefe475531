//! Logging initialization and shutdown management.

use parking_lot::{const_mutex, Mutex};
use tracing::*;
use tracing_appender::{non_blocking::WorkerGuard, rolling::RollingFileAppender};
use tracing_subscriber::{
    fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::types::LoggerConfig;

/// Keeps the non-blocking file writer alive until [`finalize`].
static FILE_GUARD: Mutex<Option<WorkerGuard>> = const_mutex(None);

/// Sled logs page-cache chatter at INFO.
const DEFAULT_DIRECTIVES: &[&str] = &["sled=warn"];

fn build_filter(config: &LoggerConfig) -> (EnvFilter, Vec<String>) {
    let mut filt = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let mut rejected = Vec::new();
    let extras = DEFAULT_DIRECTIVES
        .iter()
        .copied()
        .chain(config.extra_directives.iter().map(String::as_str));
    for raw in extras {
        match raw.parse() {
            Ok(directive) => filt = filt.add_directive(directive),
            Err(_) => rejected.push(raw.to_owned()),
        }
    }
    (filt, rejected)
}

/// Initializes the logging subsystem with the provided config.
///
/// Filtering defaults to INFO and can be overridden with `RUST_LOG`.
pub fn init(config: LoggerConfig) {
    let (stdout_filt, rejected) = build_filter(&config);

    // Configure stdout logging with JSON or compact format
    let stdout_sub = if config.stdout_config.json_format {
        layer()
            .json()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(stdout_filt)
            .boxed()
    } else {
        layer()
            .compact()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(stdout_filt)
            .boxed()
    };

    // Build optional file logging layer
    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        *FILE_GUARD.lock() = Some(guard);

        let (file_filt, _) = build_filter(&config);
        if file_config.json_format {
            layer()
                .json()
                .with_writer(writer)
                .with_ansi(false) // No color codes in files
                .with_filter(file_filt)
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filt)
                .boxed()
        }
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
        .try_init()
    {
        eprintln!("logging already initialized: {e}");
        return;
    }

    for raw in &rejected {
        warn!(directive = %raw, "ignoring unparseable log directive");
    }

    info!(
        service_name = %config.service_name,
        service_version = ?config.service_version,
        "logging initialized"
    );
}

/// Shuts down the logging subsystem, flushing buffered file output.
///
/// Should be called right before process exit.
pub fn finalize() {
    info!("shutting down logging");

    match FILE_GUARD.lock().take() {
        Some(guard) => drop(guard),
        None => debug!("no file writer to flush"),
    }
}
