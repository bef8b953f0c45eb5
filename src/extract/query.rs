//! Search terms from a free-text question

use super::topics::normalize;
use std::collections::HashSet;
use std::sync::LazyLock;

static QUESTION_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "and", "is", "of", "to", "a", "in", "that", "this", "it", "for", "on", "with",
        "as", "by", "what", "how", "when", "where", "who", "why", "can", "could", "would",
        "should", "will",
    ]
    .into_iter()
    .collect()
});

const FALLBACK_TERMS: usize = 5;

/// Terms worth searching post text for.
///
/// Drops question words and tokens of two characters or fewer. When fewer than two
/// terms survive, falls back to the first five tokens longer than two characters.
pub fn extract_query_terms(query: &str) -> Vec<String> {
    let cleaned = normalize(query);
    let long_enough = |w: &&str| w.chars().count() > 2;

    let terms: Vec<String> = cleaned
        .split_whitespace()
        .filter(long_enough)
        .filter(|w| !QUESTION_STOPWORDS.contains(w))
        .map(str::to_string)
        .collect();

    if terms.len() >= 2 {
        return terms;
    }

    cleaned
        .split_whitespace()
        .filter(long_enough)
        .take(FALLBACK_TERMS)
        .map(str::to_string)
        .collect()
}
