// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Scheme, Catalog, RankedScheme, MatchStrategy, MatchingPolicy, EmbeddingFailurePolicy, Category, CATEGORIES, DEFAULT_MIN_SIMILARITY};
pub use requests::{MatchSchemesRequest, CategoryMatchRequest};
pub use responses::{MatchSchemesResponse, HealthResponse, CategoriesResponse, ErrorResponse};
