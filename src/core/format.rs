use crate::models::RankedScheme;

/// Answer shown when neither matching path found anything
pub const NO_MATCH_MESSAGE: &str =
    "No relevant welfare scheme found. Please try again with more details.";

/// Upper bound on schemes rendered into one answer
pub const MAX_DISPLAYED: usize = 5;

/// Render matched schemes as a numbered chat answer
///
/// Each entry reads:
/// ```text
/// 1. <name>
/// <details>
/// Eligibility: <eligibility>
/// Benefits: <benefits>
/// ---
/// ```
pub fn format_answer(matches: &[RankedScheme]) -> String {
    if matches.is_empty() {
        return NO_MATCH_MESSAGE.to_string();
    }

    matches
        .iter()
        .take(MAX_DISPLAYED)
        .enumerate()
        .map(|(i, m)| {
            format!(
                "{}. {}\n{}\nEligibility: {}\nBenefits: {}\n---",
                i + 1,
                m.scheme.name(),
                m.scheme.details(),
                m.scheme.eligibility(),
                m.scheme.benefits()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
