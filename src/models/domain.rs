use serde::{Deserialize, Serialize};

/// Welfare scheme record
///
/// Every field is optional in the source data; the accessors read missing
/// values as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    #[serde(default, alias = "schemename")]
    pub name: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub eligibility: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Scheme {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn details(&self) -> &str {
        self.details.as_deref().unwrap_or("")
    }

    pub fn eligibility(&self) -> &str {
        self.eligibility.as_deref().unwrap_or("")
    }

    pub fn benefits(&self) -> &str {
        self.benefits.as_deref().unwrap_or("")
    }

    pub fn tags(&self) -> &str {
        self.tags.as_deref().unwrap_or("")
    }

    /// Text embedded for semantic matching: details followed by the name
    pub fn search_text(&self) -> String {
        format!("{} {}", self.details(), self.name())
    }
}

/// Ordered, read-only collection of schemes
///
/// A scheme's position is its identity for the duration of a matching call.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemes: Vec<Scheme>,
}

impl Catalog {
    pub fn new(schemes: Vec<Scheme>) -> Self {
        Self { schemes }
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scheme> {
        self.schemes.get(index)
    }

    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scheme> {
        self.schemes.iter()
    }
}

impl From<Vec<Scheme>> for Catalog {
    fn from(schemes: Vec<Scheme>) -> Self {
        Self::new(schemes)
    }
}

impl FromIterator<Scheme> for Catalog {
    fn from_iter<I: IntoIterator<Item = Scheme>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Scheme selected by the matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedScheme {
    #[serde(rename = "catalogIndex")]
    pub catalog_index: usize,
    /// Cosine similarity, present only for semantic matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(flatten)]
    pub scheme: Scheme,
}

/// Which path produced a match result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Similarity ranking with at least one candidate above threshold
    Semantic,
    /// Keyword fallback over the full catalog
    Keyword,
    /// Nothing ran because the catalog was empty
    Skipped,
}

/// What to do when the embedding collaborator fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Log the failure and answer from the keyword fallback
    KeywordFallback,
}

/// Matching parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingPolicy {
    pub min_similarity: f64,
    pub on_embedding_failure: EmbeddingFailurePolicy,
}

/// Relevance threshold applied to the top candidates
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.2;

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            on_embedding_failure: EmbeddingFailurePolicy::default(),
        }
    }
}

/// Browse category offered by the assistant front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub label: &'static str,
    pub icon: &'static str,
}

pub const CATEGORIES: [Category; 8] = [
    Category { label: "Education", icon: "📚" },
    Category { label: "Healthcare", icon: "🗂️" },
    Category { label: "Agriculture", icon: "🌾" },
    Category { label: "Women & Child", icon: "👶" },
    Category { label: "Employment", icon: "💼" },
    Category { label: "Housing", icon: "🏠" },
    Category { label: "Senior Citizens", icon: "👵" },
    Category { label: "Disability", icon: "♿" },
];

impl Category {
    /// Look up a category by label, ignoring case and surrounding whitespace
    pub fn find(label: &str) -> Option<Category> {
        let label = label.trim();
        CATEGORIES
            .iter()
            .copied()
            .find(|c| c.label.eq_ignore_ascii_case(label))
    }

    /// Query sent to the matcher when the category is browsed
    pub fn query(&self) -> String {
        format!("Show welfare schemes about {}", self.label)
    }
}
