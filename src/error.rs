// Library error type.
//
// Everything below the CLI returns `CorpusError` so callers can tell a missing
// cached artifact (regenerate it) apart from malformed input (surface it).
// The binary and the pipeline wrap these in anyhow with context.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = CorpusError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported filter mode: {0}")]
    InvalidMode(String),

    #[error("unknown vectorization algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("series {series} references unknown document {doc_id}")]
    UnknownSeriesDocument { series: String, doc_id: String },

    #[error("document {doc_id} is listed in both series {first} and {second}")]
    DuplicateSeriesMembership {
        doc_id: String,
        first: String,
        second: String,
    },

    #[error("unknown document {0}")]
    UnknownDocument(String),

    #[error("document {0} has no populated sentences")]
    EmptyDocument(String),

    #[error("document {doc_id} has {sentences} sentences, cannot split into {parts} parts")]
    TooFewSentences {
        doc_id: String,
        sentences: usize,
        parts: usize,
    },

    #[error("no aspect is present for every document, cannot pick a base aspect")]
    AmbiguousAspect,

    #[error("invalid aspect name {0:?}")]
    InvalidAspect(String),

    #[error("vector for {key} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CorpusError {
    /// Malformed input that is never recovered from automatically.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CorpusError::InvalidMode(_)
                | CorpusError::UnknownAlgorithm(_)
                | CorpusError::MissingArgument(_)
                | CorpusError::UnknownSeriesDocument { .. }
                | CorpusError::DuplicateSeriesMembership { .. }
                | CorpusError::UnknownDocument(_)
                | CorpusError::EmptyDocument(_)
                | CorpusError::TooFewSentences { .. }
                | CorpusError::InvalidAspect(_)
                | CorpusError::DimensionMismatch { .. }
        )
    }

    /// An expected artifact is absent; the caller may rebuild it.
    pub fn is_not_found(&self) -> bool {
        match self {
            CorpusError::NotFound(_) => true,
            CorpusError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
