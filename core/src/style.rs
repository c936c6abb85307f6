//! Style filter applied to every piece of generated text.
//!
//! Generated text must never speak as the pond in first person and must avoid
//! a fixed list of clichés and directive phrasing. [`sanitize`] removes both and
//! normalizes whitespace.

use std::sync::OnceLock;

use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;

/// Phrases stripped from generated text, matched case-insensitively.
pub const BANNED_PHRASES: [&str; 12] = [
    "ripples of",
    "autumn leaves",
    "waters of your heart",
    "ebb and flow",
    "gentle lapping",
    "on my shore",
    "my surface",
    "I reflect",
    "I hold",
    "allow yourself",
    "should",
    "you need to",
];

struct StyleFilter {
    banned: AhoCorasick,
    first_person: Regex,
}

impl StyleFilter {
    fn new() -> Self {
        let banned = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(BANNED_PHRASES)
            .expect("valid banned phrase automaton");
        // Longer forms first so "I'm" is not reduced to "'m".
        let first_person =
            Regex::new(r"(?i)\b(?:i['’]m|i\s+am|mine|my|i)\b").expect("valid first-person regex");
        Self {
            banned,
            first_person,
        }
    }

    fn strip_banned(&self, text: &str) -> String {
        self.banned.replace_all(text, &[""; BANNED_PHRASES.len()])
    }

    fn pass(&self, text: &str) -> String {
        let stripped = self.strip_banned(text);
        let stripped = self.first_person.replace_all(&stripped, "");
        collapse_whitespace(&stripped)
    }
}

fn style_filter() -> &'static StyleFilter {
    static FILTER: OnceLock<StyleFilter> = OnceLock::new();
    FILTER.get_or_init(StyleFilter::new)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove banned phrases and first-person pronouns, then collapse whitespace.
///
/// Runs until the text stops changing, so removals that splice a new banned
/// phrase together are caught too. The result is therefore idempotent.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let filter = style_filter();
    let mut current = filter.pass(text);
    loop {
        let next = filter.pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// True when the text contains at least one letter or digit.
pub(crate) fn has_words(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
