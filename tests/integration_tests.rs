// Integration tests for Yojana Match

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use yojana_match::core::{keyword_match, Matcher};
use yojana_match::models::{Catalog, MatchStrategy, Scheme};
use yojana_match::services::{load_catalog, Embedder, EmbeddingError, HashingEmbedder};

/// Deterministic embedder with fixed vectors for known texts
///
/// Unknown texts embed to `default`. Counts every call.
struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    default: Vec<f32>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    fn new(pairs: &[(&str, Vec<f32>)], default: Vec<f32>) -> Self {
        Self {
            vectors: pairs
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            default,
            calls: AtomicUsize::new(0),
        }
    }

    fn lookup(&self, text: &str) -> Vec<f32> {
        self.vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lookup(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.lookup(t)).collect())
    }
}

fn create_scheme(name: &str, details: &str, tags: &str) -> Scheme {
    Scheme {
        name: Some(name.to_string()),
        details: Some(details.to_string()),
        tags: Some(tags.to_string()),
        ..Default::default()
    }
}

fn welfare_catalog() -> Catalog {
    Catalog::new(vec![
        create_scheme("Pradhan Mantri Awas Yojana", "pucca houses for the rural poor", "housing,rural"),
        create_scheme("Beti Bachao", "girl child welfare", "women,child"),
        create_scheme("Kisan Credit Card", "short term loan for crops", "agriculture,loan"),
        create_scheme("Student Scholarship", "tuition support for students", "education"),
        create_scheme("Mudra Loan", "loan for small business", "business,loan"),
    ])
}

#[test]
fn test_integration_scholarship_scenario() {
    let query = "I am a student looking for financial help";
    let stub = Arc::new(StubEmbedder::new(
        &[
            (query, vec![1.0, 0.0]),
            ("for students Scholarship A", vec![0.8, 0.6]),
            ("for farmers Farm Subsidy", vec![0.1, 0.99499]),
        ],
        vec![0.0, 1.0],
    ));
    let matcher = Matcher::with_default_policy(stub);
    let catalog = Catalog::new(vec![
        create_scheme("Scholarship A", "for students", "education"),
        create_scheme("Farm Subsidy", "for farmers", "agriculture"),
    ]);

    let result = matcher.find_matches(query, &catalog, None, 2).unwrap();

    assert_eq!(result.strategy, MatchStrategy::Semantic);
    assert_eq!(result.schemes.len(), 1, "Farm Subsidy must be dropped, not backfilled");
    assert_eq!(result.schemes[0].scheme.name(), "Scholarship A");
    assert_eq!(result.schemes[0].catalog_index, 0);
}

#[test]
fn test_empty_catalog_returns_nothing_without_embedding() {
    let stub = Arc::new(StubEmbedder::new(&[], vec![1.0, 0.0]));
    let matcher = Matcher::with_default_policy(stub.clone());

    for top_n in [1, 5, 100] {
        let result = matcher
            .find_matches("housing", &Catalog::default(), Some("rural"), top_n)
            .unwrap();
        assert!(result.schemes.is_empty());
    }

    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_all_below_threshold_equals_keyword_match() {
    let catalog = welfare_catalog();
    // Every scheme is nearly orthogonal to the query
    let stub = Arc::new(StubEmbedder::new(
        &[
            ("loan for my farm", vec![1.0, 0.0]),
            ("loan for my farm earlier turn", vec![1.0, 0.0]),
        ],
        vec![0.1, 0.995],
    ));
    let matcher = Matcher::with_default_policy(stub);

    for top_n in 1..=5 {
        let result = matcher
            .find_matches("loan for my farm", &catalog, Some("earlier turn"), top_n)
            .unwrap();

        assert_eq!(result.strategy, MatchStrategy::Keyword);
        assert_eq!(result.schemes, keyword_match("loan for my farm", &catalog, top_n));
    }
}

#[test]
fn test_one_candidate_above_threshold_skips_fallback() {
    let catalog = welfare_catalog();
    let stub = Arc::new(StubEmbedder::new(
        &[
            ("loan", vec![1.0, 0.0]),
            ("tuition support for students Student Scholarship", vec![0.3, 0.954]),
        ],
        vec![0.0, 1.0],
    ));
    let matcher = Matcher::with_default_policy(stub);

    let result = matcher.find_matches("loan", &catalog, None, 3).unwrap();

    // Keyword fallback would have returned the two loan schemes
    assert_eq!(result.strategy, MatchStrategy::Semantic);
    assert_eq!(result.schemes.len(), 1);
    assert_eq!(result.schemes[0].scheme.name(), "Student Scholarship");
    assert!(result.schemes.iter().all(|m| m.similarity.is_some()));
}

#[test]
fn test_results_sorted_by_similarity() {
    let catalog = welfare_catalog();
    let stub = Arc::new(StubEmbedder::new(
        &[
            ("q", vec![1.0, 0.0]),
            ("pucca houses for the rural poor Pradhan Mantri Awas Yojana", vec![0.5, 0.866]),
            ("girl child welfare Beti Bachao", vec![0.9, 0.436]),
            ("loan for small business Mudra Loan", vec![0.7, 0.714]),
        ],
        vec![0.0, 1.0],
    ));
    let matcher = Matcher::with_default_policy(stub);

    let result = matcher.find_matches("q", &catalog, None, 5).unwrap();

    let indices: Vec<usize> = result.schemes.iter().map(|m| m.catalog_index).collect();
    assert_eq!(indices, vec![1, 4, 0]);
    for pair in result.schemes.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[test]
fn test_determinism_with_ties() {
    let catalog = welfare_catalog();
    // Every scheme gets the same vector, so every score ties
    let stub = Arc::new(StubEmbedder::new(&[], vec![0.6, 0.8]));
    let matcher = Matcher::with_default_policy(stub);

    let first = matcher.find_matches("anything", &catalog, Some("ctx"), 3).unwrap();
    let second = matcher.find_matches("anything", &catalog, Some("ctx"), 3).unwrap();

    assert_eq!(first, second);
    let indices: Vec<usize> = first.schemes.iter().map(|m| m.catalog_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_result_length_bound() {
    let catalog = welfare_catalog();
    let matcher = Matcher::with_default_policy(Arc::new(HashingEmbedder::default()));
    let queries = ["loan", "housing for rural poor", "girl child", "", "???", "students"];

    for query in queries {
        for top_n in [1, 2, 3, 5, 8, 50] {
            let result = matcher.find_matches(query, &catalog, None, top_n).unwrap();
            assert!(
                result.schemes.len() <= top_n.min(catalog.len()),
                "query {:?} top_n {} returned {}",
                query,
                top_n,
                result.schemes.len()
            );
        }
    }
}

#[test]
fn test_empty_query_and_context_still_embedded() {
    let stub = Arc::new(StubEmbedder::new(&[], vec![0.0, 0.0]));
    let matcher = Matcher::with_default_policy(stub.clone());

    let result = matcher.find_matches("", &welfare_catalog(), Some(""), 3).unwrap();

    assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.strategy, MatchStrategy::Keyword);
    assert!(result.schemes.is_empty());
}

#[test]
fn test_keyword_examples() {
    let catalog = Catalog::new(vec![
        create_scheme("Pradhan Mantri Awas Yojana", "", "housing,rural"),
        create_scheme("Beti Bachao", "", "women,child"),
    ]);

    let housing = keyword_match("housing schemes", &catalog, 5);
    assert_eq!(housing.len(), 1);
    assert_eq!(housing[0].scheme.name(), "Pradhan Mantri Awas Yojana");

    let loan = keyword_match("loan", &catalog, 5);
    assert!(loan.is_empty());
}

#[test]
fn test_hashing_embedder_end_to_end_on_sample_catalog() {
    let catalog = load_catalog("data/schemes.csv").expect("sample catalog loads");
    let matcher = Matcher::with_default_policy(Arc::new(HashingEmbedder::default()));

    let result = matcher
        .find_matches("scholarship for students", &catalog, None, 3)
        .unwrap();

    assert_eq!(result.strategy, MatchStrategy::Semantic);
    assert_eq!(
        result.schemes[0].scheme.name(),
        "Post Matric Scholarship for SC Students"
    );
}
