//! Error type shared by every layer of the engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A single raw record could not be turned into a `Document`.
    /// Recovered by the caller: the record is dropped and the batch continues.
    #[error("invalid document at position {position}: {reason}")]
    DocumentValidation { position: usize, reason: String },

    /// No documents, a corpus whose vocabulary is empty,
    /// or a query against an engine that was never trained or loaded.
    #[error("corpus is empty: train or load a model first")]
    EmptyCorpus,

    /// Feedback referenced a document outside the trained collection.
    #[error("feedback index {index} is out of range (document count is {document_count})")]
    InvalidFeedbackIndex { index: usize, document_count: usize },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse json from {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode model: {0}")]
    Encode(#[source] serde_cbor::Error),

    #[error("failed to decode model: {0}")]
    Decode(#[source] serde_cbor::Error),

    /// Model file decoded but its contents are inconsistent.
    #[error("model file is corrupt: {0}")]
    CorruptModel(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = Error::InvalidFeedbackIndex { index: 7, document_count: 3 };
        assert_eq!(err.to_string(), "feedback index 7 is out of range (document count is 3)");

        let err = Error::DocumentValidation { position: 2, reason: "missing field `id`".into() };
        assert!(err.to_string().contains("position 2"));
    }

    #[test]
    fn io_error_keeps_source() {
        let err = Error::io("model.cbor", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("model.cbor"));
    }
}
