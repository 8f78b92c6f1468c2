use crate::{AnswerError, Chunk, ChunkDraft, Generation, ScoredChunk, SourceDocument, StoreError};
use async_trait::async_trait;

/// Ranks stored chunks against a query. Implementations never fail: an empty
/// or low-relevance result is a valid outcome.
pub trait Retriever {
    fn retrieve(&self, query: &str, chunks: &[Chunk], top_k: usize) -> Vec<ScoredChunk>;
}

#[async_trait]
pub trait AnswerGenerator {
    fn model_identifier(&self) -> &str;

    /// Called only with a non-empty `retrieved` slice.
    async fn generate(
        &self,
        query: &str,
        retrieved: &[ScoredChunk],
    ) -> Result<Generation, AnswerError>;
}

#[async_trait]
pub trait ChunkStore {
    /// Persists every chunk of `document` as one batch, replacing any chunks
    /// previously stored for it. Either all drafts are stored or none are.
    async fn replace_document(
        &self,
        document: &SourceDocument,
        drafts: &[ChunkDraft],
    ) -> Result<Vec<Chunk>, StoreError>;

    async fn all_chunks(&self) -> Vec<Chunk>;

    async fn document_chunks(&self, document_id: &str) -> Vec<Chunk>;

    /// Returns the number of chunks dropped with the document.
    async fn remove_document(&self, document_id: &str) -> usize;
}
