//! Instruction templates for each level and phase.
//!
//! A template bundles the system instruction, its sampling temperature and the
//! [`Shape`] its output is forced into. Dialogue templates differ per level;
//! closing, transition and artifact templates are shared.

use std::borrow::Cow;

use pond_types::{ArchiveChoice, GenerationRequest, Level};

use crate::enforce::{CLOSING_MAX_WORDS, DialogueBudget, Shape, TRANSITION_MAX_WORDS};

pub const DIALOGUE_TEMPERATURE: f64 = 0.16;
pub const CLOSING_TEMPERATURE: f64 = 0.1;
pub const TRANSITION_TEMPERATURE: f64 = 0.14;
pub const ARTIFACT_TEMPERATURE: f64 = 0.12;

const DESCRIPTIVE_DIALOGUE: &str = "\
You are THE POND, a calm witness to one remembered moment.
This is Level 1, remembering: help the player recall and anchor what happened.

Reply with exactly two sentences, 60 words at most:
- First, a brief acknowledgement of what they described (facts, sensations, feelings).
- Second, one short open question of at most 30 words inviting more concrete detail, \
for example \"What did you notice most clearly?\"

Speak plainly and warmly. Address the player only as \"you\". \
Use at most one gentle metaphor. Give no advice and pass no judgment.";

const ANALYTIC_DIALOGUE: &str = "\
You are THE POND, an observer of how meaning forms.
This is Level 2, interpreting: help the player see why this moment mattered.

Reply with exactly two sentences, 65 words at most:
- First, a concise, slightly poetic synthesis of the player's own words.
- Second, one open question of at most 35 words about causes or significance, \
for example \"Why do you think this moment stayed with you?\"

Keep the language clear, grounded and causal. Address the player only as \"you\". \
Use at most one metaphor. Give no advice.";

const REFLEXIVE_DIALOGUE: &str = "\
You are THE POND, a quiet mirror for insight.
This is Level 3, reflecting: help the player connect the memory to their values, \
growth or view of the world.

Reply with exactly two sentences, 65 words at most:
- First, a short reflection on what the memory reveals.
- Second, one open question of at most 35 words about values, change or \
self-understanding, for example \"How might this shape what you do tomorrow?\"

Stay gentle and open-ended. Address the player only as \"you\". \
Use at most one metaphor. Give no advice and draw no moral.";

const CLOSING: &str = "\
Write ONE validating sentence of at most 28 words. Address the player as \"you\". \
Ask no question and give no advice. Use plain language. Summarize the player's most \
recent notes while respecting the earlier context.";

const TRANSITION: &str = "\
You are THE POND, a neutral storyteller closing one level of the ritual.
Write a transition of 3 to 4 sentences, 70 words at most, that covers:
1. what the player remembered or described in this level;
2. what meaning surfaced in their words, if any;
3. what the next level will explore, described in the abstract;
4. a grounding final line with no question and no advice.

Use second person only. Keep it plain, reflective and slightly poetic.";

const ARTIFACT: &str = "\
You are THE POND, keeper of the archive.
Write a closing synthesis of exactly two sentences, 45 words at most.
Summarize what happened, why it mattered, and what it revealed about the player \
or the world. Use second person only and give no advice. One gentle metaphor is allowed.
End the second sentence with the choice tag ({choice}) inline.";

/// Which kind of text is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePhase {
    /// A dialogue round (statement plus question).
    Dialogue,
    /// The single validating sentence that closes a level.
    Closing,
    /// The paragraph that summarizes a closed level.
    Transition,
    /// The final artifact for the chosen disposition.
    Artifact(ArchiveChoice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionTemplate {
    pub system: Cow<'static, str>,
    pub temperature: f64,
    pub shape: Shape,
}

impl InstructionTemplate {
    /// Request pairing this template's instruction with the given context.
    #[must_use]
    pub fn request(&self, context: impl Into<String>) -> GenerationRequest {
        GenerationRequest::instructed(self.system.as_ref(), context, self.temperature)
    }
}

/// Word limits for each level's dialogue reply.
#[must_use]
pub const fn dialogue_budget(level: Level) -> DialogueBudget {
    match level {
        Level::Descriptive => DialogueBudget {
            question_words: 30,
            total_words: 60,
        },
        Level::Analytic | Level::Reflexive => DialogueBudget {
            question_words: 35,
            total_words: 65,
        },
    }
}

#[must_use]
pub fn select_template(level: Level, phase: TemplatePhase) -> InstructionTemplate {
    match phase {
        TemplatePhase::Dialogue => {
            let system = match level {
                Level::Descriptive => DESCRIPTIVE_DIALOGUE,
                Level::Analytic => ANALYTIC_DIALOGUE,
                Level::Reflexive => REFLEXIVE_DIALOGUE,
            };
            InstructionTemplate {
                system: Cow::Borrowed(system),
                temperature: DIALOGUE_TEMPERATURE,
                shape: Shape::Dialogue(dialogue_budget(level)),
            }
        }
        TemplatePhase::Closing => InstructionTemplate {
            system: Cow::Borrowed(CLOSING),
            temperature: CLOSING_TEMPERATURE,
            shape: Shape::SingleSentence {
                max_words: CLOSING_MAX_WORDS,
            },
        },
        TemplatePhase::Transition => InstructionTemplate {
            system: Cow::Borrowed(TRANSITION),
            temperature: TRANSITION_TEMPERATURE,
            shape: Shape::Paragraph {
                max_words: TRANSITION_MAX_WORDS,
            },
        },
        TemplatePhase::Artifact(choice) => InstructionTemplate {
            system: Cow::Owned(ARTIFACT.replace("{choice}", choice.as_str())),
            temperature: ARTIFACT_TEMPERATURE,
            shape: Shape::Artifact(choice),
        },
    }
}

#[cfg(test)]
mod tests {
    use pond_types::{ArchiveChoice, ChatRole, Level};

    use super::{TemplatePhase, dialogue_budget, select_template};
    use crate::enforce::Shape;

    #[test]
    fn dialogue_templates_differ_per_level() {
        let systems: Vec<_> = Level::ALL
            .into_iter()
            .map(|level| select_template(level, TemplatePhase::Dialogue).system)
            .collect();
        assert!(systems[0].contains("Level 1"));
        assert!(systems[1].contains("Level 2"));
        assert!(systems[2].contains("Level 3"));
    }

    #[test]
    fn temperatures_follow_phase() {
        let temp = |phase| select_template(Level::Analytic, phase).temperature;
        assert!((temp(TemplatePhase::Dialogue) - 0.16).abs() < f64::EPSILON);
        assert!((temp(TemplatePhase::Closing) - 0.1).abs() < f64::EPSILON);
        assert!((temp(TemplatePhase::Transition) - 0.14).abs() < f64::EPSILON);
        assert!((temp(TemplatePhase::Artifact(ArchiveChoice::Hold)) - 0.12).abs() < f64::EPSILON);
    }

    #[test]
    fn artifact_template_names_the_choice() {
        let template = select_template(Level::Reflexive, TemplatePhase::Artifact(ArchiveChoice::Sink));
        assert!(template.system.contains("choice tag (sink) inline"));
        assert!(!template.system.contains("{choice}"));
        assert_eq!(template.shape, Shape::Artifact(ArchiveChoice::Sink));
    }

    #[test]
    fn dialogue_shape_uses_level_budget() {
        let template = select_template(Level::Descriptive, TemplatePhase::Dialogue);
        assert_eq!(template.shape, Shape::Dialogue(dialogue_budget(Level::Descriptive)));
        assert_eq!(dialogue_budget(Level::Reflexive).total_words, 65);
    }

    #[test]
    fn request_carries_system_and_context() {
        let request = select_template(Level::Descriptive, TemplatePhase::Closing).request("Title: Lake");
        assert_eq!(request.content_of(ChatRole::User), Some("Title: Lake"));
        assert!(request.content_of(ChatRole::System).unwrap().starts_with("Write ONE"));
    }
}
