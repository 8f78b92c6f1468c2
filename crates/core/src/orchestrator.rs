use crate::answer::{Answerer, TemplateGenerator};
use crate::chunking::{split_text, ChunkingConfig};
use crate::embeddings::{Embedder, HashSeededEmbedder};
use crate::retrieval::LexicalRetriever;
use crate::traits::{AnswerGenerator, ChunkStore, Retriever};
use crate::{
    AnswerError, AnswerResult, Chunk, ChunkDraft, IngestError, IngestWarning, IngestionReport,
    ProcessedDocument, RagConfig, SourceDocument,
};
use tracing::{debug, info, warn};

pub type DefaultRagService = RagService<HashSeededEmbedder, LexicalRetriever, TemplateGenerator>;

/// Ties chunking, embedding, retrieval and answer generation together.
pub struct RagService<E, R, G> {
    config: RagConfig,
    embedder: E,
    retriever: R,
    answerer: Answerer<G>,
}

impl DefaultRagService {
    pub fn from_config(config: RagConfig) -> Result<Self, IngestError> {
        let embedder = HashSeededEmbedder::new(config.embedding_dimensions);
        let retriever = LexicalRetriever::from(&config);
        Self::new(config, embedder, retriever, TemplateGenerator::default())
    }
}

impl<E, R, G> RagService<E, R, G>
where
    E: Embedder + Send + Sync,
    R: Retriever + Send + Sync,
    G: AnswerGenerator + Send + Sync,
{
    pub fn new(
        config: RagConfig,
        embedder: E,
        retriever: R,
        generator: G,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        let answerer = Answerer::new(generator).with_timeout(config.generation_timeout());

        Ok(Self {
            config,
            embedder,
            retriever,
            answerer,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Splits raw document text into numbered, embedded chunk drafts.
    ///
    /// Text with no usable content yields no drafts and an
    /// [`IngestWarning::EmptyInput`] warning rather than an error.
    pub fn process_document(&self, raw_text: &str) -> Result<ProcessedDocument, IngestError> {
        let pieces = split_text(raw_text, ChunkingConfig::from(&self.config))?;

        let mut chunks = Vec::with_capacity(pieces.len());
        for content in pieces.into_iter().filter(|piece| !piece.is_empty()) {
            let index = u32::try_from(chunks.len()).map_err(|_| {
                IngestError::InvalidArgument("document produced too many chunks".to_string())
            })?;
            let embedding = self.embedder.embed(&content);
            chunks.push(ChunkDraft {
                content,
                index,
                embedding: Some(embedding),
            });
        }

        let mut warnings = Vec::new();
        if chunks.is_empty() {
            warn!("document text is empty, no chunks produced");
            warnings.push(IngestWarning::EmptyInput);
        }

        Ok(ProcessedDocument { chunks, warnings })
    }

    /// Chunks `document` completely before touching `store`, then writes all
    /// of its chunks as one batch.
    pub async fn ingest_document<S>(
        &self,
        store: &S,
        document: &SourceDocument,
    ) -> Result<IngestionReport, IngestError>
    where
        S: ChunkStore + Sync,
    {
        let processed = self.process_document(&document.content)?;

        let chunk_count = if processed.chunks.is_empty() {
            store.remove_document(&document.document_id).await;
            0
        } else {
            store
                .replace_document(document, &processed.chunks)
                .await?
                .len()
        };

        info!(
            document_id = %document.document_id,
            title = %document.title,
            chunk_count,
            "document processed"
        );

        Ok(IngestionReport {
            document_id: document.document_id.clone(),
            chunk_count,
            warnings: processed.warnings,
        })
    }

    /// Retrieves the configured top-k chunks from `available_chunks` and
    /// answers from them. Nothing is cached between calls, so a failed call
    /// can be retried with the same query.
    pub async fn answer_question(
        &self,
        query: &str,
        available_chunks: &[Chunk],
    ) -> Result<AnswerResult, AnswerError> {
        debug!(pool_size = available_chunks.len(), "retrieving chunks");
        let retrieved = self
            .retriever
            .retrieve(query, available_chunks, self.config.top_k);
        debug!(hits = retrieved.len(), "chunks retrieved");

        self.answerer.answer(query, &retrieved).await
    }
}
