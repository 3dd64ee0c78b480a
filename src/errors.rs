// errors.rs
use std::fmt;

use crate::embedder::EmbedError;

/// A record rejected on ingest or before projection.
/// `field` names the offending column so callers can surface it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// A filter or search request rejected at the query boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    pub field: &'static str,
    pub message: String,
}

impl QueryError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bad query field '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for QueryError {}

/// Errors from reading or writing the persisted artifacts.
#[derive(Debug)]
pub enum StoreError {
    Db(String),
    Io(String),
    Csv(String),
    /// Catalog and index on disk do not belong to the same build.
    ArtifactMismatch(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(msg) => write!(f, "Database error: {msg}"),
            StoreError::Io(msg) => write!(f, "I/O error: {msg}"),
            StoreError::Csv(msg) => write!(f, "CSV error: {msg}"),
            StoreError::ArtifactMismatch(msg) => write!(f, "Artifact mismatch: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "Corrupt artifact: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Db(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e.to_string())
    }
}

/// Errors originating from either the server logic
/// (routing, bad input) or downstream layers (store, external services).
#[derive(Debug)]
pub enum ServerError {
    NotFound,
    BadRequest(String),
    Query(QueryError),
    Store(StoreError),
    Embedding(EmbedError),
    XlsxError(String),
    InternalError,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::NotFound => write!(f, "Not Found"),
            ServerError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ServerError::Query(e) => write!(f, "Bad Request: {e}"),
            ServerError::Store(e) => write!(f, "{e}"),
            ServerError::Embedding(e) => write!(f, "Embedding service error: {e}"),
            ServerError::XlsxError(msg) => write!(f, "XLSX export error: {msg}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<QueryError> for ServerError {
    fn from(e: QueryError) -> Self {
        ServerError::Query(e)
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        ServerError::Store(e)
    }
}

impl From<EmbedError> for ServerError {
    fn from(e: EmbedError) -> Self {
        ServerError::Embedding(e)
    }
}
