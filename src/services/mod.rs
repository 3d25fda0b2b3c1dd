// Service exports
pub mod cache;
pub mod catalog;
pub mod embedding;
pub mod hashing;
pub mod session;

pub use cache::{CachedEmbedder, CacheStats};
pub use catalog::{load_catalog, CatalogError};
pub use embedding::{Embedder, EmbeddingError, HttpEmbedder};
pub use hashing::HashingEmbedder;
pub use session::SessionStore;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use std::sync::Arc;

/// Build the embedding collaborator described by the settings
///
/// The provider is wrapped in a [`CachedEmbedder`] unless `cache_size` is 0.
pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let provider: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProvider::Http => {
            if settings.api_base.is_empty() {
                return Err(EmbeddingError::Config("embedding.api_base is empty".into()));
            }
            Arc::new(HttpEmbedder::new(
                &settings.api_base,
                &settings.path,
                settings.model.clone(),
                settings.api_key.clone(),
                settings.dimensions,
                settings.timeout_ms,
            )?)
        }
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(
            settings.dimensions.unwrap_or(hashing::DEFAULT_HASHING_DIMENSIONS),
        )?),
    };

    let cache_size = settings.cache_size.unwrap_or(10_000);
    if cache_size == 0 {
        return Ok(provider);
    }

    Ok(Arc::new(CachedEmbedder::new(provider, cache_size)))
}
