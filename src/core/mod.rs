// Core algorithm exports
pub mod format;
pub mod keyword;
pub mod matcher;
pub mod scoring;
pub mod similarity;

pub use format::{format_answer, NO_MATCH_MESSAGE};
pub use keyword::{keyword_match, matches_keywords, tokenize};
pub use matcher::{compose_search_text, Matcher, MatchError, MatchResult};
pub use scoring::{apply_threshold, score_candidates, select_top_n, Candidate};
pub use similarity::cosine_similarity;
