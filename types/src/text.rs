//! Small pure text helpers.

/// Number of whitespace-separated words in `s`.
#[must_use]
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Keep at most `max_words` whitespace-separated words, joined by single spaces.
///
/// Truncation is whole-word: a word is never split.
#[must_use]
pub fn take_words(s: &str, max_words: usize) -> String {
    s.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
