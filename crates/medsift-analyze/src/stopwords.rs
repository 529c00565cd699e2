//! English stop words filtered during keyword extraction.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Articles
        "a", "an", "the",
        // Pronouns
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
        "my", "your", "his", "its", "our", "their", "mine", "yours", "hers", "ours", "theirs",
        // Prepositions
        "in", "on", "at", "by", "for", "with", "from", "to", "of", "about", "into", "onto",
        "through", "during", "before", "after", "above", "below", "up", "down", "out", "off",
        "over", "under", "again", "further", "then", "once",
        // Conjunctions
        "and", "or", "but", "if", "because", "as", "until", "while", "whereas", "since",
        // Common verbs
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "doing", "will", "would", "should", "could", "may", "might",
        "can", "cannot", "must", "shall",
        // Determiners and adverbs
        "this", "that", "these", "those", "all", "each", "every", "both", "few", "more",
        "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same",
        "so", "than", "too", "very", "just", "now",
        // Question words
        "when", "where", "why", "how", "what", "who", "which", "whose", "whom",
        // Spelled-out numbers
        "one", "two", "three", "first", "second", "third",
    ]
    .into_iter()
    .collect()
});

/// Whether a lowercased token is a stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}
