use moka::sync::Cache;
use std::sync::Arc;

use crate::services::embedding::{Embedder, EmbeddingError};

/// Embedding cache in front of another embedder
///
/// Catalog texts are embedded on every match call; caching them keeps the
/// per-request cost down to the query embedding. Entries are keyed by the
/// exact input text, which is sound because embedders are deterministic.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl CachedEmbedder {
    /// Wrap `inner` with a cache holding at most `max_entries` vectors
    pub fn new(inner: Arc<dyn Embedder>, max_entries: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_entries),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            entries: self.cache.entry_count(),
        }
    }
}

impl Embedder for CachedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(hit) = self.cache.get(text) {
            tracing::trace!("Embedding cache hit ({} chars)", text.len());
            return Ok(hit.as_ref().clone());
        }

        let embedding = self.inner.embed(text)?;
        self.cache.insert(text.to_string(), Arc::new(embedding.clone()));
        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut slots: Vec<Option<Vec<f32>>> = texts
            .iter()
            .map(|text| self.cache.get(text).map(|hit| hit.as_ref().clone()))
            .collect();

        let missing: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_none().then_some(i))
            .collect();

        tracing::trace!(
            "Embedding cache: {} hits, {} misses",
            texts.len() - missing.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let to_embed: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&to_embed)?;

            if fresh.len() != to_embed.len() {
                return Err(EmbeddingError::BatchSizeMismatch {
                    expected: to_embed.len(),
                    actual: fresh.len(),
                });
            }

            for (&i, embedding) in missing.iter().zip(fresh) {
                self.cache.insert(texts[i].clone(), Arc::new(embedding.clone()));
                slots[i] = Some(embedding);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
}
