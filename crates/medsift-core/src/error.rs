//! Error types for MedSift.

use thiserror::Error;

use crate::kinds::AnalysisKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate document: external_id={0}")]
    DuplicateDocument(String),

    #[error("Analysis error ({kind}, document {document_id}): {message}")]
    Analysis {
        kind: AnalysisKind,
        document_id: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
