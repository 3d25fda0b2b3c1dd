use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to match schemes against a free-text query
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchSchemesRequest {
    #[validate(length(min = 1, max = 2000))]
    pub query: String,
    /// Prior conversation turns supplied by the caller
    #[validate(length(max = 8000))]
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, alias = "session_id", rename = "sessionId")]
    pub session_id: Option<String>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default, alias = "top_n", rename = "topN")]
    pub top_n: Option<u16>,
}

/// Request to browse one of the fixed categories
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryMatchRequest {
    #[serde(default, alias = "session_id", rename = "sessionId")]
    pub session_id: Option<String>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default, alias = "top_n", rename = "topN")]
    pub top_n: Option<u16>,
}
