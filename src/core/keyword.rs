use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Catalog, RankedScheme, Scheme};

/// Runs of letters and digits; underscore and punctuation separate tokens
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\W_]+").expect("word pattern is valid"));

/// Split text into lowercase word tokens, in order, duplicates kept
pub fn word_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Distinct lowercase word tokens of a query
pub fn tokenize(query: &str) -> BTreeSet<String> {
    word_tokens(query).into_iter().collect()
}

/// Check whether any token occurs inside the scheme's name or tags
///
/// Substring semantics: the token `hous` matches the tag `housing`.
#[inline]
pub fn matches_keywords(scheme: &Scheme, tokens: &BTreeSet<String>) -> bool {
    if tokens.is_empty() {
        return false;
    }

    let name = scheme.name().to_lowercase();
    let tags = scheme.tags().to_lowercase();

    tokens
        .iter()
        .any(|token| name.contains(token.as_str()) || tags.contains(token.as_str()))
}

/// Keyword fallback matcher
///
/// Scans the catalog in order and stops as soon as `top_n` schemes matched,
/// so a better match later in the catalog can be skipped. Results carry no
/// similarity score.
pub fn keyword_match(query: &str, catalog: &Catalog, top_n: usize) -> Vec<RankedScheme> {
    let tokens = tokenize(query);
    let limit = top_n.max(1);
    let mut matches = Vec::new();

    if tokens.is_empty() {
        tracing::debug!("Keyword fallback: query has no word tokens");
        return matches;
    }

    for (catalog_index, scheme) in catalog.iter().enumerate() {
        if matches_keywords(scheme, &tokens) {
            matches.push(RankedScheme {
                catalog_index,
                similarity: None,
                scheme: scheme.clone(),
            });
            if matches.len() >= limit {
                break;
            }
        }
    }

    tracing::debug!(
        "Keyword fallback: {} tokens, {} matches (limit {})",
        tokens.len(),
        matches.len(),
        limit
    );

    matches
}
