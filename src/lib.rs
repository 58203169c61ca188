use controllers::{ExtractError, RecordError, WriteError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kube Error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Kubeconfig load error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("Secret store is not reachable: {0}")]
    StoreUnreachable(#[source] kube::Error),

    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Metrics registration error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Log filter error: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Tracing init error: {0}")]
    TracingInit(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[cfg(feature = "telemetry")]
    #[error("Trace exporter error: {0}")]
    TraceExporter(#[from] opentelemetry_otlp::ExporterBuildError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn metric_label(&self) -> &'static str {
        match self {
            Error::Extract(ExtractError::ConnectionConfig(_)) => "connection_config",
            Error::Extract(ExtractError::MissingConnectionConfig) => "missing_connection_config",
            Error::Record(_) => "record",
            Error::Write(WriteError::Create(_)) => "create",
            _ => "other",
        }
    }
}

/// Shared state, diagnostics and handler context
pub mod controller;
pub use crate::controller::*;
pub mod api;
pub mod config;
pub mod controllers;

/// Log and trace integrations
pub mod telemetry;

/// Metrics
mod metrics;
pub use metrics::Metrics;
