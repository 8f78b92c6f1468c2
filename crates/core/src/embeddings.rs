use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// Turns text into a fixed-length feature vector.
///
/// Implementations must be deterministic for a given text, since stored chunk
/// embeddings are compared against freshly embedded queries.
pub trait Embedder {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Placeholder embedder: every dimension is drawn uniformly from `[-1, 1]`
/// by a generator seeded from the SHA-256 of the text.
#[derive(Debug, Clone, Copy)]
pub struct HashSeededEmbedder {
    pub dimensions: usize,
}

impl Default for HashSeededEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl HashSeededEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

fn text_seed(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed)
}

impl Embedder for HashSeededEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(text_seed(text));
        (0..self.dimensions.max(1))
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect()
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f32> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut dot = 0f32;
    let mut left_norm = 0f32;
    let mut right_norm = 0f32;
    for (a, b) in left.iter().zip(right) {
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    let magnitude = left_norm.sqrt() * right_norm.sqrt();
    if magnitude > 0.0 {
        Some(dot / magnitude)
    } else {
        None
    }
}
