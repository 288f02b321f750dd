use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("cannot build span exporter: {0}")]
    Exporter(String),
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("cannot forward log records: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
}
