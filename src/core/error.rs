use thiserror::Error;

use crate::bigquery::TableUpdateError;

#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Auth error: {0}")]
    Auth(String),
    #[error("Cannot create BigQuery client for project {project}: {reason}")]
    ClientInit { project: String, reason: String },
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error(transparent)]
    Update(#[from] TableUpdateError),
    #[error("Sheet error: {0}")]
    Sheet(String),
    #[error("Cannot write status to row {row}: {reason}")]
    WriteStatus { row: u32, reason: String },
}

impl From<std::io::Error> for ClusterError {
    fn from(err: std::io::Error) -> Self {
        ClusterError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for ClusterError {
    fn from(err: config::ConfigError) -> Self {
        ClusterError::ConfigParsingError(err.to_string())
    }
}
