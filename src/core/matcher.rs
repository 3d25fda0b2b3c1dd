use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Catalog, EmbeddingFailurePolicy, MatchStrategy, MatchingPolicy, RankedScheme};
use crate::core::{
    keyword::keyword_match,
    scoring::{apply_threshold, score_candidates, select_top_n},
};
use crate::services::embedding::{Embedder, EmbeddingError};

/// Result of the matching process
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub schemes: Vec<RankedScheme>,
    pub strategy: MatchStrategy,
    pub total_candidates: usize,
}

/// Errors returned to the caller of [`Matcher::find_matches`]
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Compose the search text from query and context
/// 2. Embed the search text and every scheme (one batch call)
/// 3. Score, keep the `top_n` best, drop those under the threshold
/// 4. If nothing survives, answer from the keyword fallback instead
///
/// The matcher holds no mutable state; clones share the embedder.
#[derive(Clone)]
pub struct Matcher {
    embedder: Arc<dyn Embedder>,
    policy: MatchingPolicy,
}

impl Matcher {
    pub fn new(embedder: Arc<dyn Embedder>, policy: MatchingPolicy) -> Self {
        Self { embedder, policy }
    }

    pub fn with_default_policy(embedder: Arc<dyn Embedder>) -> Self {
        Self::new(embedder, MatchingPolicy::default())
    }

    pub fn policy(&self) -> &MatchingPolicy {
        &self.policy
    }

    /// Find the schemes most relevant to a query
    ///
    /// # Arguments
    /// * `query` - The user's question
    /// * `catalog` - Snapshot of all schemes
    /// * `context` - Prior conversation text, appended to the query for scoring
    /// * `top_n` - Maximum number of schemes to return (clamped to 1..=catalog size)
    ///
    /// # Returns
    /// MatchResult with schemes in similarity order, or in catalog order when
    /// the keyword fallback answered
    pub fn find_matches(
        &self,
        query: &str,
        catalog: &Catalog,
        context: Option<&str>,
        top_n: usize,
    ) -> Result<MatchResult, MatchError> {
        let total_candidates = catalog.len();

        if catalog.is_empty() {
            tracing::debug!("Empty catalog, skipping matching");
            return Ok(MatchResult {
                schemes: Vec::new(),
                strategy: MatchStrategy::Skipped,
                total_candidates,
            });
        }

        let top_n = top_n.clamp(1, total_candidates);
        let search_text = compose_search_text(query, context);

        let semantic = match self.rank_semantic(&search_text, catalog, top_n) {
            Ok(ranked) => ranked,
            Err(e) => match self.policy.on_embedding_failure {
                EmbeddingFailurePolicy::Propagate => return Err(e.into()),
                EmbeddingFailurePolicy::KeywordFallback => {
                    tracing::warn!("Embedding failed, answering from keyword fallback: {}", e);
                    Vec::new()
                }
            },
        };

        if !semantic.is_empty() {
            return Ok(MatchResult {
                schemes: semantic,
                strategy: MatchStrategy::Semantic,
                total_candidates,
            });
        }

        // The fallback sees the query alone, never the context
        let schemes = keyword_match(query, catalog, top_n);
        Ok(MatchResult {
            schemes,
            strategy: MatchStrategy::Keyword,
            total_candidates,
        })
    }

    /// Similarity ranking with threshold; empty when nothing clears it
    fn rank_semantic(
        &self,
        search_text: &str,
        catalog: &Catalog,
        top_n: usize,
    ) -> Result<Vec<RankedScheme>, EmbeddingError> {
        let query_embedding = self.embedder.embed(search_text)?;

        let scheme_texts: Vec<String> = catalog.iter().map(|s| s.search_text()).collect();
        let scheme_embeddings = self.embedder.embed_batch(&scheme_texts)?;

        if scheme_embeddings.len() != scheme_texts.len() {
            return Err(EmbeddingError::BatchSizeMismatch {
                expected: scheme_texts.len(),
                actual: scheme_embeddings.len(),
            });
        }

        if let Some(bad) = scheme_embeddings
            .iter()
            .find(|e| e.len() != query_embedding.len())
        {
            return Err(EmbeddingError::InvalidDimension {
                expected: query_embedding.len(),
                actual: bad.len(),
            });
        }

        let scores = score_candidates(&query_embedding, &scheme_embeddings);
        let top = select_top_n(&scores, top_n);

        if let Some(best) = top.first() {
            tracing::debug!(
                "Semantic ranking: {} candidates, best index={} score={:.3}",
                scores.len(),
                best.index,
                best.score
            );
        }

        let kept = apply_threshold(top, self.policy.min_similarity);

        tracing::debug!(
            "{} of top {} candidates cleared threshold {}",
            kept.len(),
            top_n,
            self.policy.min_similarity
        );

        Ok(kept
            .into_iter()
            .filter_map(|candidate| {
                catalog.get(candidate.index).map(|scheme| RankedScheme {
                    catalog_index: candidate.index,
                    similarity: Some(candidate.score),
                    scheme: scheme.clone(),
                })
            })
            .collect())
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Query followed by a single space and the context, when there is context
pub fn compose_search_text(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => format!("{} {}", query, context),
        _ => query.to_string(),
    }
}
