use std::cmp::Ordering;

use crate::core::similarity::cosine_similarity;

/// Candidate position and similarity score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub score: f64,
}

/// Score every scheme embedding against the query embedding
///
/// Scores are returned in catalog order. Callers must have checked that all
/// vectors share the query's dimension.
pub fn score_candidates(query: &[f32], schemes: &[Vec<f32>]) -> Vec<f64> {
    schemes
        .iter()
        .map(|embedding| cosine_similarity(query, embedding))
        .collect()
}

/// Pick the `top_n` highest scores
///
/// Sorted by score (descending), ties broken by catalog index (ascending) so
/// the ranking is deterministic.
pub fn select_top_n(scores: &[f64], top_n: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| Candidate { index, score })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });

    candidates.truncate(top_n);
    candidates
}

/// Drop candidates scoring below the relevance threshold
///
/// Applied to the already-selected top candidates, never to the whole
/// catalog: a scheme ranked just outside `top_n` is not reconsidered.
#[inline]
pub fn apply_threshold(candidates: Vec<Candidate>, min_similarity: f64) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.score >= min_similarity)
        .collect()
}
