//! Assembling the user message sent with every generation request.

use crate::session::RitualSession;

/// Title, offering, closed-level summaries and the current level's notes,
/// as blank-line separated sections. Empty sections are omitted.
///
/// On the first level the offering counts as a note. If no notes exist yet,
/// the offering stands in for them so the model always has something concrete.
#[must_use]
pub fn build_context(session: &RitualSession) -> String {
    let mut sections = vec![format!("Title: {}", session.title())];

    if !session.offering().is_empty() {
        sections.push(format!("Offering: {}", session.offering()));
    }
    if !session.summaries().is_empty() {
        let bullets: Vec<String> = session
            .summaries()
            .iter()
            .map(|s| format!("- {}: {}", s.level_name, s.summary_text.trim()))
            .collect();
        sections.push(format!("Previous level syntheses:\n{}", bullets.join("\n")));
    }

    let notes = current_level_notes(session);
    if !notes.is_empty() {
        sections.push(format!("Current level notes:\n{notes}"));
    }

    sections.join("\n\n")
}

fn current_level_notes(session: &RitualSession) -> String {
    let mut notes: Vec<&str> = Vec::new();
    if session.level().index() == 0 && !session.offering().is_empty() {
        notes.push(session.offering());
    }
    notes.extend(session.level_notes());
    let joined = notes.join("\n");
    let joined = joined.trim();
    if joined.is_empty() {
        session.offering().to_string()
    } else {
        joined.to_string()
    }
}

/// Context for the level-closing transition, naming the level that follows.
#[must_use]
pub fn transition_context(session: &RitualSession, next_name: &str) -> String {
    format!("{}\n\nNext level: {next_name}.", build_context(session))
}

/// The closed-level summaries, one per line, for the final artifact.
#[must_use]
pub fn artifact_context(session: &RitualSession) -> String {
    session
        .summaries()
        .iter()
        .map(|s| s.summary_text.trim())
        .collect::<Vec<_>>()
        .join("\n")
}
