use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A single line of the ingestion file could not be turned into a record.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("Malformed line: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("Unexpected shape: {0}")]
    Shape(&'static str),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No remote url configured for {}", .path.display())]
    NoRemote { path: PathBuf },
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote answered HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Still a placeholder after {attempts} fetch attempt(s): {}", .path.display())]
    PlaceholderPersisted { path: PathBuf, attempts: u32 },
    #[error("Cannot read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("No valid records ({lines_errored} of {lines_read} lines failed)")]
    Empty { lines_read: usize, lines_errored: usize },
    #[error("Load did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("Load worker failed: {0}")]
    Join(String),
}

/// Query-level failures. The first two are the caller's fault, `NoData` is ours.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No search parameters provided")]
    EmptyCriteria,
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("No data loaded")]
    NoData,
}

impl QueryError {
    pub fn is_client_fault(&self) -> bool {
        !matches!(self, QueryError::NoData)
    }
}

#[derive(Error, Debug)]
pub enum BookshelfError {
    #[error("Config error: {0}")]
    Config(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BookshelfError>;

// Helper conversions
impl From<config::ConfigError> for BookshelfError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
