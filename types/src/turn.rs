//! Rendered turn data handed to the presentation layer.

use serde::Serialize;

use crate::focus::Level;

/// Which part of the ritual a turn belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseLabel {
    RoundOne,
    RoundTwo,
    Transition,
    Synthesis,
    Choice,
    Artifact,
    Complete,
}

impl PhaseLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PhaseLabel::RoundOne => "Round 1",
            PhaseLabel::RoundTwo => "Round 2",
            PhaseLabel::Transition => "Transition",
            PhaseLabel::Synthesis => "Synthesis",
            PhaseLabel::Choice => "Choice",
            PhaseLabel::Artifact => "Memory Artifact",
            PhaseLabel::Complete => "Complete",
        }
    }
}

impl std::fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pond response, as structured data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub level: Level,
    pub level_name: &'static str,
    pub icon: &'static str,
    pub phase_label: PhaseLabel,
    pub metaphor: &'static str,
    pub body: String,
}

impl Turn {
    #[must_use]
    pub fn new(level: Level, phase_label: PhaseLabel, body: impl Into<String>) -> Self {
        let focus = level.focus();
        Self {
            level,
            level_name: focus.name,
            icon: focus.icon,
            phase_label,
            metaphor: focus.metaphor,
            body: body.into(),
        }
    }
}
