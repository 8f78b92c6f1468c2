pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod retrieval;
pub mod store;
pub mod traits;

pub use answer::{
    compose_answer, Answerer, TemplateGenerator, MOCK_MODEL_IDENTIFIER, NO_INFORMATION_ANSWER,
};
pub use chunking::{split_text, ChunkingConfig};
pub use embeddings::{
    cosine_similarity, Embedder, HashSeededEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{AnswerError, IngestError, StoreError};
pub use ingest::{discover_text_files, read_source_document};
pub use models::{
    AnswerResult, Chunk, ChunkDraft, Generation, IngestWarning, IngestionReport, ProcessedDocument,
    RagConfig, ScoredChunk, SourceCitation, SourceDocument,
};
pub use orchestrator::{DefaultRagService, RagService};
pub use retrieval::{preview, EmbeddingRetriever, LexicalRetriever};
pub use store::InMemoryChunkStore;
pub use traits::{AnswerGenerator, ChunkStore, Retriever};
