use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_TOP_K: usize = 3;

/// Raw extracted text of one uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub document_id: String,
    pub title: String,
    pub content: String,
}

/// A chunk as produced by document processing, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkDraft {
    pub content: String,
    pub index: u32,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub document_title: String,
    pub index: u32,
    pub content: String,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f64,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceCitation {
    pub document_title: String,
    pub chunk_id: String,
    pub relevance_score: f64,
}

impl From<&ScoredChunk> for SourceCitation {
    fn from(value: &ScoredChunk) -> Self {
        Self {
            document_title: value.chunk.document_title.clone(),
            chunk_id: value.chunk.id.clone(),
            relevance_score: value.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub text: String,
    pub sources: Vec<SourceCitation>,
    pub model_identifier: String,
    pub processing_seconds: f64,
}

/// Output of one generation backend call.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    /// Latency the backend wants reported instead of the measured call time.
    pub simulated_latency: Option<Duration>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IngestWarning {
    /// The document text produced no non-empty chunk.
    EmptyInput,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessedDocument {
    pub chunks: Vec<ChunkDraft>,
    pub warnings: Vec<IngestWarning>,
}

#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub document_id: String,
    pub chunk_count: usize,
    pub warnings: Vec<IngestWarning>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_dimensions: usize,
    pub generation_timeout_secs: u64,
    pub keywords: Vec<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            embedding_dimensions: crate::embeddings::DEFAULT_EMBEDDING_DIMENSIONS,
            generation_timeout_secs: crate::answer::DEFAULT_GENERATION_TIMEOUT.as_secs(),
            keywords: crate::retrieval::DEFAULT_KEYWORDS
                .iter()
                .map(|keyword| (*keyword).to_string())
                .collect(),
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<(), crate::IngestError> {
        crate::chunking::ChunkingConfig::from(self).validate()?;
        if self.top_k == 0 {
            return Err(crate::IngestError::InvalidArgument(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.generation_timeout_secs == 0 {
            return Err(crate::IngestError::InvalidArgument(
                "generation_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.embedding_dimensions == 0 {
            return Err(crate::IngestError::InvalidArgument(
                "embedding_dimensions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}
