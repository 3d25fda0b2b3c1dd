//! Yojana Match - welfare scheme matching service for the Yojanasaathi assistant
//!
//! This library ranks catalog schemes against a user query by embedding
//! similarity, with a relevance threshold and a keyword fallback when no
//! scheme is similar enough.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, MatchResult, MatchError, keyword_match, cosine_similarity};
pub use models::{Scheme, Catalog, RankedScheme, MatchStrategy, MatchingPolicy, EmbeddingFailurePolicy};
pub use services::{Embedder, EmbeddingError};
