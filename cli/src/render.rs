//! Plain-text rendering of pond turns and stored sessions.

use pond_core::{ArchiveRecord, Phase, RitualSession};
use pond_types::{PhaseLabel, Turn};

/// Header line, the level's metaphor (plus its focus when a level opens), then the body.
pub fn render_turn(turn: &Turn) -> String {
    let header = format!(
        "{} Level {} — {} · {}",
        turn.icon,
        turn.level.number(),
        turn.level_name,
        turn.phase_label
    );
    if turn.phase_label == PhaseLabel::RoundOne {
        let hint = turn.level.focus().hint;
        format!("{header}\n({} Focus: {hint}.)\n\n{}", turn.metaphor, turn.body)
    } else {
        format!("{header}\n({})\n\n{}", turn.metaphor, turn.body)
    }
}

/// One line per archived memory: when, what, and where it went.
pub fn archived_line(record: &ArchiveRecord) -> String {
    format!(
        "{}  \"{}\" ({})",
        record.timestamp, record.title, record.archive_choice
    )
}

/// One-line summary of where a stored session stands.
pub fn session_status(session: Option<&RitualSession>) -> String {
    let Some(session) = session else {
        return "(reset)".to_string();
    };
    let stage = match session.phase() {
        Phase::Normal => format!("Level {} in progress", session.level().number()),
        Phase::AwaitingLevelDecision => {
            format!("Level {} closed, awaiting decision", session.level().number())
        }
        Phase::AwaitingArchiveChoice => "awaiting float, sink or hold".to_string(),
        Phase::Finished(choice) => format!("finished ({choice})"),
    };
    format!("\"{}\": {stage}", session.title())
}
