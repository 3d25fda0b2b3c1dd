use serde::{Deserialize, Serialize};
use crate::models::domain::{Category, MatchStrategy, RankedScheme};

/// Response for the match endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSchemesResponse {
    pub matches: Vec<RankedScheme>,
    pub strategy: MatchStrategy,
    /// Display-ready answer text
    pub answer: String,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_size: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Category listing response
#[derive(Debug, Clone, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
