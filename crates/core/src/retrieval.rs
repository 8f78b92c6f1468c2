use crate::embeddings::{cosine_similarity, Embedder};
use crate::models::{Chunk, RagConfig, ScoredChunk};
use crate::traits::Retriever;
use std::collections::HashSet;

pub const DEFAULT_KEYWORDS: [&str; 8] = [
    "rag",
    "system",
    "システム",
    "ai",
    "machine learning",
    "機械学習",
    "test",
    "テスト",
];

pub const PREVIEW_CHARS: usize = 200;

/// Score given to a chunk that matched nothing, so a non-empty pool always
/// yields candidates.
pub const NO_MATCH_FLOOR: f64 = 0.1;

const SUBSTRING_BONUS: f64 = 1.0;
const KEYWORD_BONUS: f64 = 2.0;

/// Cuts `text` to `max_chars` characters, appending `...` when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|token| token.to_lowercase())
        .collect()
}

#[derive(Debug, Clone)]
pub struct LexicalRetriever {
    keywords: Vec<String>,
}

impl Default for LexicalRetriever {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|keyword| (*keyword).to_string()))
    }
}

impl From<&RagConfig> for LexicalRetriever {
    fn from(value: &RagConfig) -> Self {
        Self::new(value.keywords.iter().cloned())
    }
}

impl LexicalRetriever {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    fn mentions_keyword(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }

    /// Raw heuristic score before the no-match floor.
    pub fn score(&self, query: &str, content: &str) -> f64 {
        let query_lower = query.to_lowercase();
        let content_lower = content.to_lowercase();
        let query_tokens = tokenize(&query_lower);
        let content_tokens = tokenize(&content_lower);

        let mut score = query_tokens.intersection(&content_tokens).count() as f64;

        if query_tokens
            .iter()
            .any(|token| token.chars().count() > 2 && content_lower.contains(token.as_str()))
        {
            score += SUBSTRING_BONUS;
        }

        if self.mentions_keyword(&query_lower) && self.mentions_keyword(&content_lower) {
            score += KEYWORD_BONUS;
        }

        score
    }
}

impl Retriever for LexicalRetriever {
    fn retrieve(&self, query: &str, chunks: &[Chunk], top_k: usize) -> Vec<ScoredChunk> {
        let candidates = chunks
            .iter()
            .map(|chunk| {
                let raw = self.score(query, &chunk.content);
                let score = if raw == 0.0 { NO_MATCH_FLOOR } else { raw };
                (chunk, score)
            })
            .filter(|(_, score)| *score > 0.0)
            .map(|(chunk, score)| scored(chunk, score))
            .collect();

        top_ranked(candidates, top_k)
    }
}

/// Ranks chunks by cosine similarity between the query embedding and each
/// chunk's stored embedding. Chunks without a usable embedding are skipped.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingRetriever<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingRetriever<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }
}

impl<E: Embedder> Retriever for EmbeddingRetriever<E> {
    fn retrieve(&self, query: &str, chunks: &[Chunk], top_k: usize) -> Vec<ScoredChunk> {
        if chunks.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_vector = self.embedder.embed(query);
        let candidates = chunks
            .iter()
            .filter_map(|chunk| {
                let embedding = chunk.embedding.as_deref()?;
                let similarity = cosine_similarity(&query_vector, embedding)?;
                (similarity > 0.0).then(|| scored(chunk, f64::from(similarity)))
            })
            .collect();

        top_ranked(candidates, top_k)
    }
}

fn scored(chunk: &Chunk, score: f64) -> ScoredChunk {
    ScoredChunk {
        chunk: chunk.clone(),
        score,
        preview: preview(&chunk.content, PREVIEW_CHARS),
    }
}

// Stable sort, so equal scores keep pool order.
fn top_ranked(mut candidates: Vec<ScoredChunk>, top_k: usize) -> Vec<ScoredChunk> {
    candidates.sort_by(|left, right| right.score.total_cmp(&left.score));
    candidates.truncate(top_k);
    candidates
}
