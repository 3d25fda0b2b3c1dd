use fnv::FnvHasher;
use std::hash::Hasher;

use crate::core::keyword::word_tokens;
use crate::services::embedding::{Embedder, EmbeddingError};

pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// Offline embedder built from hashed word counts
///
/// Each lowercase word token is hashed (FNV-1a) into one of `dimensions`
/// buckets and the resulting count vector is L2-normalized. Similarity is
/// therefore lexical overlap, not meaning; it exists so the service can run
/// without a model endpoint. Text with no word tokens embeds to the zero
/// vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, EmbeddingError> {
        if dimensions == 0 {
            return Err(EmbeddingError::Config(
                "hashing embedder needs at least one dimension".into(),
            ));
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = FnvHasher::default();
        hasher.write(token.as_bytes());
        (hasher.finish() % self.dimensions as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_HASHING_DIMENSIONS,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for token in word_tokens(text) {
            vector[self.bucket(&token)] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
