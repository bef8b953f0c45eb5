//! Frequency-based topic keywords

use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Texts shorter than this (in characters) yield no topics
pub const MIN_TEXT_CHARS: usize = 50;

/// Default number of topics per post
pub const DEFAULT_TOPIC_COUNT: usize = 5;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern"));

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "and", "is", "of", "to", "a", "in", "that", "this", "it", "for", "on", "with",
        "as", "by", "i", "you", "we", "they", "he", "she", "my", "your", "their", "his", "her",
        "its", "our", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had",
        "do", "does", "did", "but", "or", "if", "because", "until", "while", "at", "from",
        "after", "over", "under", "again", "further", "then", "once", "here", "there", "when",
        "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
        "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
        "can", "will", "just", "should", "now",
    ]
    .into_iter()
    .collect()
});

/// Lower-case and drop every character that is neither a word character nor whitespace
pub(crate) fn normalize(text: &str) -> String {
    PUNCTUATION.replace_all(&text.to_lowercase(), "").into_owned()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Keyboard-mash and elongation artifacts: fewer than three distinct characters,
/// or at most two runs of repeated characters ("aaaabbbb", "ssssss").
pub fn is_noisy(token: &str) -> bool {
    let mut distinct: Vec<char> = Vec::with_capacity(4);
    let mut runs = 0;
    let mut prev = None;
    for c in token.chars() {
        if prev != Some(c) {
            runs += 1;
            prev = Some(c);
        }
        if distinct.len() < 3 && !distinct.contains(&c) {
            distinct.push(c);
        }
    }
    distinct.len() < 3 || runs <= 2
}

fn keep_token(token: &str) -> bool {
    token.chars().count() > 2
        && !is_stopword(token)
        && token.chars().all(char::is_alphabetic)
        && !is_noisy(token)
}

/// Top `k` keywords of `text` by descending frequency.
///
/// Equal counts keep first-seen order, so the result is deterministic.
pub fn extract_topics(text: &str, k: usize) -> Vec<String> {
    if k == 0 || text.chars().count() < MIN_TEXT_CHARS {
        return Vec::new();
    }

    let cleaned = normalize(text);
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for token in cleaned.split_whitespace().filter(|t| keep_token(t)) {
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // stable: ties stay in insertion order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(k)
        .map(|(word, _)| word.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_has_no_topics() {
        assert!(extract_topics("rust rust rust", 5).is_empty());
        assert!(extract_topics("", 5).is_empty());
    }

    #[test]
    fn test_frequency_order_with_first_seen_ties() {
        let text = "Bitcoin mining uses energy. Bitcoin prices rise while mining \
                    difficulty grows, energy debates continue.";
        let topics = extract_topics(text, 3);
        assert_eq!(topics, vec!["bitcoin", "mining", "energy"]);
    }

    #[test]
    fn test_filters() {
        let text = "The ssssssssswswwwwwsswws cryptocurrency aaaabbbb market 2024 \
                    is up, and it's cryptocurrency season for xyz traders.";
        let topics = extract_topics(text, 10);
        assert_eq!(topics[0], "cryptocurrency");
        assert!(!topics.iter().any(|t| t == "ssssssssswswwwwwsswws"));
        assert!(!topics.iter().any(|t| t == "aaaabbbb"));
        assert!(!topics.iter().any(|t| t == "2024"));
        assert!(!topics.iter().any(|t| t == "the" || t == "and"));
        // "it's" collapses to the stopword "its"
        assert!(!topics.iter().any(|t| t == "its" || t == "it"));
    }

    #[test]
    fn test_noise_heuristic() {
        assert!(is_noisy("ssssssssswswwwwwsswws"));
        assert!(is_noisy("aaaabbbb"));
        assert!(is_noisy("ssssss"));
        assert!(!is_noisy("cryptocurrency"));
        assert!(!is_noisy("abc"));
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("Don't STOP, believing!"), "dont stop believing");
    }

    #[test]
    fn test_deterministic() {
        let text = "graph databases store nodes and edges; graph queries walk edges between nodes quickly";
        assert_eq!(extract_topics(text, 5), extract_topics(text, 5));
    }
}
