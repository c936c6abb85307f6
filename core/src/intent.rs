//! Classifying free-text player replies at decision points.
//!
//! Matching is on whole words (or whole multi-word phrases) after lowercasing,
//! so "ok" matches "ok, go" but not "book".

use pond_types::ArchiveChoice;

/// Affirmations longer than this are treated as content, not a command.
pub const MAX_CONTINUE_WORDS: usize = 5;
/// Replies longer than this count as elaboration even without a keyword.
pub const ELABORATION_WORD_THRESHOLD: usize = 5;

struct PhraseSet(&'static [&'static str]);

impl PhraseSet {
    fn matches(&self, tokens: &[String]) -> bool {
        self.0.iter().any(|phrase| contains_phrase(tokens, phrase))
    }
}

const CONTINUE: PhraseSet = PhraseSet(&[
    "yes",
    "y",
    "okay",
    "ok",
    "sure",
    "continue",
    "next",
    "proceed",
    "go on",
    "move on",
    "deeper",
    "ready",
    "let's go",
    "lets go",
    "let's continue",
    "lets continue",
    "let's move",
    "lets move",
]);

const ELABORATE: PhraseSet = PhraseSet(&[
    "no", "not yet", "wait", "more", "another", "add", "stay", "one more",
]);

const FLOAT: PhraseSet = PhraseSet(&["float", "accept", "integrate", "keep", "let it float"]);
const SINK: PhraseSet = PhraseSet(&["sink", "release", "let go", "submerge", "drop"]);
const HOLD: PhraseSet = PhraseSet(&["hold", "keep awhile", "not yet", "later", "wait", "pause"]);

/// Lowercased words, with curly apostrophes folded to `'` and kept inside words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('’', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\''))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split(' ').collect();
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(token, word)| token == word))
}

/// What the player wants at the end of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Move on to the next level.
    Continue,
    /// Stay and add detail to the current level.
    Elaborate,
    /// Neither; the player is reminded of the options.
    Unrecognized,
}

/// Short affirmative replies continue; keywords such as "more" or any reply
/// longer than five words elaborate. Affirmation is checked first.
///
/// A reply of more than five words that contains an affirmative keyword but
/// no elaboration keyword still elaborates, because it exceeds the length
/// threshold.
#[must_use]
pub fn classify_continuation(reply: &str) -> Continuation {
    let tokens = tokenize(reply);
    let words = reply.split_whitespace().count();
    if words <= MAX_CONTINUE_WORDS && CONTINUE.matches(&tokens) {
        Continuation::Continue
    } else if ELABORATE.matches(&tokens) || words > ELABORATION_WORD_THRESHOLD {
        Continuation::Elaborate
    } else {
        Continuation::Unrecognized
    }
}

/// The player's reply to the float / sink / hold prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveIntent {
    Float,
    Sink,
    Hold,
    Unrecognized,
}

impl ArchiveIntent {
    #[must_use]
    pub const fn choice(self) -> Option<ArchiveChoice> {
        match self {
            ArchiveIntent::Float => Some(ArchiveChoice::Float),
            ArchiveIntent::Sink => Some(ArchiveChoice::Sink),
            ArchiveIntent::Hold => Some(ArchiveChoice::Hold),
            ArchiveIntent::Unrecognized => None,
        }
    }
}

impl From<ArchiveChoice> for ArchiveIntent {
    fn from(choice: ArchiveChoice) -> Self {
        match choice {
            ArchiveChoice::Float => ArchiveIntent::Float,
            ArchiveChoice::Sink => ArchiveIntent::Sink,
            ArchiveChoice::Hold => ArchiveIntent::Hold,
        }
    }
}

/// Keyword sets are tested in the order float, sink, hold; the first hit wins.
/// Falls back to an exact match on the choice name.
#[must_use]
pub fn classify_archive_choice(reply: &str) -> ArchiveIntent {
    let reply = reply.trim();
    if reply.is_empty() {
        return ArchiveIntent::Unrecognized;
    }
    let tokens = tokenize(reply);
    if FLOAT.matches(&tokens) {
        ArchiveIntent::Float
    } else if SINK.matches(&tokens) {
        ArchiveIntent::Sink
    } else if HOLD.matches(&tokens) {
        ArchiveIntent::Hold
    } else {
        ArchiveChoice::parse(reply).map_or(ArchiveIntent::Unrecognized, ArchiveIntent::from)
    }
}
