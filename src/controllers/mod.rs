use thiserror::Error;

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Connection config decode error: {0}")]
    ConnectionConfig(#[from] serde_yaml::Error),

    #[error("Connection config is missing from the secret payload")]
    MissingConnectionConfig,
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Cluster config serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type WriteResult<T> = std::result::Result<T, WriteError>;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Create error: {0}")]
    Create(#[source] kube::Error),
}

pub mod extract;
pub mod handler;
pub mod record;
pub mod watcher;
pub mod writer;
