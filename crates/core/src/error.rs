use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store rejected chunks: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("chunk indices for document {document_id} are not contiguous: expected {expected}, found {found}")]
    NonContiguousIndex {
        document_id: String,
        expected: u32,
        found: u32,
    },

    #[error("no chunks supplied for document {0}")]
    EmptyBatch(String),
}

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("answer generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("answer generation failed: {0}")]
    GenerationFailed(String),
}

impl AnswerError {
    /// Both kinds leave the question untouched, so asking again is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnswerError::GenerationTimeout(_) | AnswerError::GenerationFailed(_)
        )
    }
}
