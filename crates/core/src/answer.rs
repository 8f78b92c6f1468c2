use crate::models::{AnswerResult, Generation, ScoredChunk, SourceCitation};
use crate::traits::AnswerGenerator;
use crate::AnswerError;
use async_trait::async_trait;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const NO_INFORMATION_ANSWER: &str = "I'm sorry, I could not find any related information in the uploaded documents. Please ask a more specific question or upload documents that cover this topic.";

pub const MOCK_MODEL_IDENTIFIER: &str = "mock-gpt-3.5-turbo";

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

const QUOTED_CHUNKS: usize = 2;
const QUOTE_CHARS: usize = 150;
const EXPLANATORY_MARKERS: [&str; 4] = ["what is", "about", "とは", "について"];
const CLOSING: &str = "I hope this information helps. If you need more detail, please ask a more specific follow-up question.";

// Keeps processing_seconds positive when no backend call was made.
const MIN_REPORTED_SECONDS: f64 = 0.001;

fn find_marker(text: &str, marker: &str) -> Option<usize> {
    text.char_indices().map(|(index, _)| index).find(|index| {
        text.get(*index..index + marker.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(marker))
    })
}

fn strip_marker(text: &str, marker: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(position) = find_marker(rest, marker) {
        stripped.push_str(&rest[..position]);
        rest = &rest[position + marker.len()..];
    }
    stripped.push_str(rest);
    stripped
}

fn opening(query: &str) -> String {
    let trimmed = query.trim();

    if EXPLANATORY_MARKERS
        .iter()
        .any(|marker| find_marker(trimmed, marker).is_some())
    {
        let without_markers = EXPLANATORY_MARKERS
            .iter()
            .fold(trimmed.to_string(), |text, marker| strip_marker(&text, marker));
        let subject = without_markers
            .trim()
            .trim_end_matches(['?', '？'])
            .trim();
        let subject = if subject.is_empty() { trimmed } else { subject };
        return format!(
            "Regarding {subject}, the uploaded documents contain the following information:\n\n"
        );
    }

    if trimmed.ends_with(['?', '？']) {
        return "Based on consulting the documents for your question:\n\n".to_string();
    }

    format!("Regarding \"{trimmed}\", the following information is available:\n\n")
}

fn quote(text: &str) -> &str {
    match text.char_indices().nth(QUOTE_CHARS) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Builds the templated answer text for a non-empty set of retrieved chunks.
pub fn compose_answer(query: &str, retrieved: &[ScoredChunk]) -> String {
    let mut answer = opening(query);
    for (position, hit) in retrieved.iter().take(QUOTED_CHUNKS).enumerate() {
        answer.push_str(&format!("{}. {}...\n\n", position + 1, quote(&hit.preview)));
    }
    answer.push_str(CLOSING);
    answer
}

/// Stand-in generation backend that fills a template from the retrieved
/// previews and reports a simulated latency instead of sleeping.
#[derive(Debug, Clone, Copy)]
pub struct TemplateGenerator {
    latency_range: (f64, f64),
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self {
            latency_range: (0.8, 2.5),
        }
    }
}

#[async_trait]
impl AnswerGenerator for TemplateGenerator {
    fn model_identifier(&self) -> &str {
        MOCK_MODEL_IDENTIFIER
    }

    async fn generate(
        &self,
        query: &str,
        retrieved: &[ScoredChunk],
    ) -> Result<Generation, AnswerError> {
        let (low, high) = self.latency_range;
        let seconds = rand::thread_rng().gen_range(low..=high);
        Ok(Generation {
            text: compose_answer(query, retrieved),
            simulated_latency: Some(Duration::from_secs_f64(seconds)),
        })
    }
}

pub struct Answerer<G> {
    generator: G,
    timeout: Duration,
}

impl<G> Answerer<G>
where
    G: AnswerGenerator + Send + Sync,
{
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_identifier(&self) -> &str {
        self.generator.model_identifier()
    }

    /// Synthesizes an answer citing every retrieved chunk.
    ///
    /// With nothing retrieved the fixed fallback message is returned and the
    /// backend is not called. A backend call that outlives the timeout is
    /// dropped and reported as [`AnswerError::GenerationTimeout`].
    pub async fn answer(
        &self,
        query: &str,
        retrieved: &[ScoredChunk],
    ) -> Result<AnswerResult, AnswerError> {
        let started = Instant::now();

        if retrieved.is_empty() {
            debug!("no chunks retrieved, returning fallback answer");
            return Ok(AnswerResult {
                text: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
                model_identifier: self.model_identifier().to_string(),
                processing_seconds: reported_seconds(started.elapsed()),
            });
        }

        let generation =
            match tokio::time::timeout(self.timeout, self.generator.generate(query, retrieved))
                .await
            {
                Ok(Ok(generation)) => generation,
                Ok(Err(error)) => {
                    warn!(%error, model = self.model_identifier(), "answer generation failed");
                    return Err(error);
                }
                Err(_) => {
                    warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        model = self.model_identifier(),
                        "answer generation timed out"
                    );
                    return Err(AnswerError::GenerationTimeout(self.timeout));
                }
            };

        let latency = generation
            .simulated_latency
            .unwrap_or_else(|| started.elapsed());

        Ok(AnswerResult {
            text: generation.text,
            sources: retrieved.iter().map(SourceCitation::from).collect(),
            model_identifier: self.model_identifier().to_string(),
            processing_seconds: reported_seconds(latency),
        })
    }
}

fn reported_seconds(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64().max(MIN_REPORTED_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;
    use chrono::Utc;

    fn hit(id: &str, content: &str, score: f64) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: id.to_string(),
                document_id: "doc-1".to_string(),
                document_title: "Handbook".to_string(),
                index: 0,
                content: content.to_string(),
                embedding: None,
                created_at: Utc::now(),
            },
            score,
            preview: crate::retrieval::preview(content, crate::retrieval::PREVIEW_CHARS),
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl AnswerGenerator for SlowGenerator {
        fn model_identifier(&self) -> &str {
            "slow"
        }

        async fn generate(
            &self,
            _query: &str,
            _retrieved: &[ScoredChunk],
        ) -> Result<Generation, AnswerError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Generation {
                text: "late".to_string(),
                simulated_latency: None,
            })
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl AnswerGenerator for FailingGenerator {
        fn model_identifier(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _query: &str,
            _retrieved: &[ScoredChunk],
        ) -> Result<Generation, AnswerError> {
            Err(AnswerError::GenerationFailed("quota exceeded".to_string()))
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        fn model_identifier(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            query: &str,
            _retrieved: &[ScoredChunk],
        ) -> Result<Generation, AnswerError> {
            Ok(Generation {
                text: query.to_string(),
                simulated_latency: None,
            })
        }
    }

    #[tokio::test]
    async fn empty_retrieval_returns_fallback() {
        let answerer = Answerer::new(TemplateGenerator::default());
        let result = answerer.answer("anything", &[]).await.unwrap();
        assert_eq!(result.text, NO_INFORMATION_ANSWER);
        assert!(result.sources.is_empty());
        assert_eq!(result.model_identifier, MOCK_MODEL_IDENTIFIER);
        assert!(result.processing_seconds > 0.0);
    }

    #[tokio::test]
    async fn every_retrieved_chunk_is_cited() {
        let answerer = Answerer::new(TemplateGenerator::default());
        let retrieved = vec![
            hit("c1", "first passage", 5.0),
            hit("c2", "second passage", 3.0),
            hit("c3", "third passage", 0.1),
        ];

        let result = answerer.answer("pump maintenance", &retrieved).await.unwrap();
        assert_eq!(result.sources.len(), 3);
        assert_eq!(result.sources[2].chunk_id, "c3");
        assert_eq!(result.sources[0].relevance_score, 5.0);
        assert_eq!(result.sources[0].document_title, "Handbook");
        assert!(result.text.contains("1. first passage..."));
        assert!(result.text.contains("2. second passage..."));
        assert!(!result.text.contains("third passage"));
        assert!((0.8..=2.5).contains(&result.processing_seconds));
    }

    #[test]
    fn opening_follows_query_shape() {
        let retrieved = vec![hit("c1", "RAG is retrieval augmented generation", 5.0)];

        let definition = compose_answer("What is RAG?", &retrieved);
        assert!(definition.starts_with("Regarding RAG, the uploaded documents"));

        let japanese = compose_answer("RAGとは", &retrieved);
        assert!(japanese.starts_with("Regarding RAG, the uploaded documents"));

        let question = compose_answer("How does indexing work?", &retrieved);
        assert!(question.starts_with("Based on consulting the documents"));

        let statement = compose_answer("indexing pipeline", &retrieved);
        assert!(statement.starts_with("Regarding \"indexing pipeline\""));
        assert!(statement.ends_with(CLOSING));
    }

    #[test]
    fn quotes_are_cut_to_150_characters() {
        let long = "x".repeat(400);
        let text = compose_answer("long", &[hit("c1", &long, 1.0)]);
        let expected = format!("1. {}...", "x".repeat(150));
        assert!(text.contains(&expected));
        assert!(!text.contains(&"x".repeat(151)));
    }

    #[tokio::test]
    async fn slow_generation_times_out() {
        let answerer = Answerer::new(SlowGenerator).with_timeout(Duration::from_millis(20));
        let error = answerer
            .answer("question", &[hit("c1", "passage", 1.0)])
            .await
            .unwrap_err();
        assert!(matches!(error, AnswerError::GenerationTimeout(_)));
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced() {
        let answerer = Answerer::new(FailingGenerator);
        let error = answerer
            .answer("question", &[hit("c1", "passage", 1.0)])
            .await
            .unwrap_err();
        assert!(matches!(error, AnswerError::GenerationFailed(_)));
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn measured_latency_is_reported_without_simulation() {
        let answerer = Answerer::new(EchoGenerator);
        let result = answerer
            .answer("question", &[hit("c1", "passage", 1.0)])
            .await
            .unwrap();
        assert_eq!(result.text, "question");
        assert_eq!(result.model_identifier, "echo");
        assert!(result.processing_seconds > 0.0);
        assert!(result.processing_seconds < 1.0);
    }
}
