//! Shape contracts for generated text.
//!
//! Models drift: they ask two questions, write four sentences, or forget the
//! question entirely. Every generation is passed through a [`Shape`] before it
//! reaches the transcript, so the player always sees text of the agreed form.
//! Each enforcer sanitizes via [`crate::style::sanitize`] and falls back to a
//! fixed sentence when nothing usable survives.

use pond_types::{ArchiveChoice, take_words, word_count};

use crate::style::{has_words, sanitize};

pub const FALLBACK_STATEMENT: &str = "You've named something clearly.";
pub const FALLBACK_QUESTION: &str = "What detail stands out most?";
pub const FALLBACK_CLOSING: &str = "You described the moment with enough detail to hold it.";
pub const FALLBACK_PARAGRAPH: &str = "You clarified what happened and how it felt. \
     We'll carry those details and look for patterns next. \
     The aim is understanding, not judgment.";
/// Second sentence used when the artifact summary comes back as a single sentence.
pub const ARTIFACT_PAD: &str = "You will keep this as a clear, simple note.";

pub const CLOSING_MAX_WORDS: usize = 45;
pub const TRANSITION_MAX_WORDS: usize = 80;
pub const ARTIFACT_MAX_WORDS: usize = 42;

const TERMINAL: [char; 4] = ['.', '!', '?', '…'];

/// Word limits for a statement-plus-question reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueBudget {
    pub question_words: usize,
    pub total_words: usize,
}

/// The form a generated text must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// One statement followed by exactly one open question.
    Dialogue(DialogueBudget),
    /// One validating sentence, no question.
    SingleSentence { max_words: usize },
    /// A short paragraph of whole sentences.
    Paragraph { max_words: usize },
    /// Two-sentence summary with the stance clause appended.
    Artifact(ArchiveChoice),
}

impl Shape {
    #[must_use]
    pub fn enforce(self, raw: &str) -> String {
        match self {
            Shape::Dialogue(budget) => enforce_dialogue(raw, budget),
            Shape::SingleSentence { max_words } => enforce_single_sentence(raw, max_words),
            Shape::Paragraph { max_words } => enforce_paragraph(raw, max_words),
            Shape::Artifact(choice) => enforce_artifact(raw, choice),
        }
    }
}

/// Split text into sentences at whitespace that follows `.`, `?` or `!`.
///
/// Fragments are trimmed and empty fragments dropped.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '?' | '!')) {
            push_fragment(&mut sentences, &text[start..idx]);
            start = idx;
        }
        prev = Some(ch);
    }
    push_fragment(&mut sentences, &text[start..]);
    sentences
}

fn push_fragment<'a>(sentences: &mut Vec<&'a str>, fragment: &'a str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        sentences.push(fragment);
    }
}

/// Keep at most `max_words` words. When words were dropped, trailing `,`/`;`
/// is removed and a period added unless the cut already ends a sentence.
fn limit_words(text: &str, max_words: usize) -> String {
    if word_count(text) <= max_words {
        return text.to_string();
    }
    let mut out = take_words(text, max_words);
    let kept = out.trim_end_matches([',', ';', ' ']).len();
    out.truncate(kept);
    if !out.is_empty() && !out.ends_with(TERMINAL) {
        out.push('.');
    }
    out
}

fn ensure_terminal(text: &mut String) {
    if !text.ends_with(TERMINAL) {
        text.push('.');
    }
}

fn shape_question(raw: &str, max_words: usize) -> Option<String> {
    let cleaned = sanitize(raw);
    let trimmed = cleaned.trim_end_matches(['.', '!', '…', ' ']);
    let taken = take_words(trimmed, max_words);
    let body = taken.trim_end_matches(['?', ',', ';', ' ']);
    if !has_words(body) {
        return None;
    }
    // The closing mark is the only question mark in the turn.
    let mut question = body.replace('?', ".");
    question.push('?');
    Some(question)
}

fn shape_statement(raw: &str, max_words: usize) -> Option<String> {
    let cleaned = sanitize(raw);
    if !has_words(&cleaned) {
        return None;
    }
    let mut statement = limit_words(&cleaned, max_words).replace('?', ".");
    ensure_terminal(&mut statement);
    Some(statement)
}

/// Statement plus one question, `"{statement} {question}"`.
///
/// The question comes from the second detected sentence and the statement
/// from the first. Anything after the second sentence is discarded.
#[must_use]
pub fn enforce_dialogue(raw: &str, budget: DialogueBudget) -> String {
    let sentences = split_sentences(raw);

    let question = sentences
        .get(1)
        .and_then(|q| shape_question(q, budget.question_words))
        .unwrap_or_else(|| FALLBACK_QUESTION.to_string());

    let statement_budget = budget.total_words.saturating_sub(word_count(&question));
    let statement = sentences
        .first()
        .and_then(|s| shape_statement(s, statement_budget))
        .unwrap_or_else(|| FALLBACK_STATEMENT.to_string());

    format!("{statement} {question}")
}

/// The first sentence only, ending in a period.
#[must_use]
pub fn enforce_single_sentence(raw: &str, max_words: usize) -> String {
    let sentence = split_sentences(raw)
        .first()
        .map(|s| sanitize(s))
        .filter(|s| has_words(s))
        .unwrap_or_else(|| FALLBACK_CLOSING.to_string());
    let limited = limit_words(&sentence, max_words);
    let body = limited.trim_end_matches(['.', '!', '?', '…', ',', ';', ' ']);
    format!("{body}.")
}

/// All detected sentences joined with single spaces.
#[must_use]
pub fn enforce_paragraph(raw: &str, max_words: usize) -> String {
    let joined = split_sentences(raw).join(" ");
    let cleaned = sanitize(&joined);
    if !has_words(&cleaned) {
        return FALLBACK_PARAGRAPH.to_string();
    }
    let mut out = limit_words(&cleaned, max_words);
    ensure_terminal(&mut out);
    out
}

/// Fixed clause describing the player's archive choice.
#[must_use]
pub const fn stance_clause(choice: ArchiveChoice) -> &'static str {
    match choice {
        ArchiveChoice::Float => "You chose to let it float: accepted and held lightly.",
        ArchiveChoice::Sink => "You chose to let it sink: released and set down.",
        ArchiveChoice::Hold => "You chose to hold it awhile: kept close for now.",
    }
}

/// Two-sentence summary (at most 42 words), a blank line, then the stance clause.
#[must_use]
pub fn enforce_artifact(raw: &str, choice: ArchiveChoice) -> String {
    let mut sentences = split_sentences(raw);
    sentences.truncate(2);
    if sentences.len() < 2 {
        sentences.push(ARTIFACT_PAD);
    }
    let summary = sanitize(&limit_words(&sentences.join(" "), ARTIFACT_MAX_WORDS));
    let summary = if has_words(&summary) {
        summary
    } else {
        ARTIFACT_PAD.to_string()
    };
    format!("{summary}\n\n{}", stance_clause(choice))
}
