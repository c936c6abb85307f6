//! The ritual state machine.
//!
//! Every player reply goes through [`RitualEngine::advance`], which routes on
//! the session's [`Phase`]:
//!
//! ```text
//! Normal ──round 1──► round 2 ──► closing + transition ──┬─► AwaitingLevelDecision
//!   ▲                                                    └─► AwaitingArchiveChoice (last level)
//!   └──── continue ◄── AwaitingLevelDecision ──more──► closing sentence, stay
//! AwaitingArchiveChoice ──float/sink/hold──► Finished (artifact)
//! ```
//!
//! Each step makes at most two generation calls, awaited one after another.

use chrono::Utc;

use pond_providers::GenerationClient;
use pond_types::{ArchiveChoice, HistoryEntry, Level, LevelSynthesis, PhaseLabel, Turn};

use crate::archive::{ArchiveOutcome, ArchiveRecord, ArchiveStore};
use crate::context::{artifact_context, build_context, transition_context};
use crate::error::RitualError;
use crate::intent::{Continuation, classify_archive_choice, classify_continuation};
use crate::prompts::{TemplatePhase, select_template};
use crate::session::{Phase, RitualSession, RoundStep};

/// Name given to the stage after the last level in the transition context.
const ARCHIVING_STAGE: &str = "Archiving";

pub const ARCHIVE_PROMPT: &str =
    "The reflection feels complete. Do you let it float, sink, or hold it awhile longer?";
pub const ARCHIVE_REMINDER: &str =
    "You can say float, sink, or hold, whichever feels right for this memory.";
pub const LEVEL_DECISION_REMINDER: &str =
    "If you'd like to go deeper, say continue. Or add another detail to stay a little longer.";
pub const LINGER_INVITE: &str = "The pond grows quiet. Share more, or say continue to go deeper.";
pub const RITUAL_COMPLETE: &str = "The ritual is complete.";

fn next_level_invite(next: Level) -> String {
    format!(
        "The pond grows quiet. Say continue to move to Level {}: {}, or add one more detail to linger here.",
        next.number(),
        next.name()
    )
}

/// Drives sessions through the ritual using one generation backend.
#[derive(Debug, Clone)]
pub struct RitualEngine<C> {
    client: C,
}

impl<C: GenerationClient> RitualEngine<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Start a ritual and produce its first pond turn.
    ///
    /// The offering is treated as the player's first reply.
    pub async fn begin(&self, title: &str, offering: &str) -> Result<(RitualSession, Turn), RitualError> {
        let mut session = RitualSession::start(title, offering)?;
        tracing::info!(title = %session.title(), "Beginning ritual");
        let first_reply = session.offering().to_string();
        let turn = self.advance(&mut session, &first_reply).await?;
        Ok((session, turn))
    }

    /// Apply one player reply and return the pond's response.
    ///
    /// On a generation error the session may already hold the reply; see
    /// [`RitualError`].
    pub async fn advance(&self, session: &mut RitualSession, reply: &str) -> Result<Turn, RitualError> {
        let reply = reply.trim();
        match session.phase() {
            Phase::Finished(_) => Ok(Turn::new(session.level(), PhaseLabel::Complete, RITUAL_COMPLETE)),
            Phase::AwaitingArchiveChoice => self.choose_disposition(session, reply).await,
            Phase::AwaitingLevelDecision => self.decide_level(session, reply).await,
            Phase::Normal => self.play_round(session, reply).await,
        }
    }

    /// Save (or decline to save) a finished ritual.
    ///
    /// The session is never modified. If it finished without an artifact, one
    /// is generated for the record only.
    pub async fn archive(
        &self,
        session: &RitualSession,
        save: bool,
        store: &dyn ArchiveStore,
    ) -> Result<ArchiveOutcome, RitualError> {
        let Some(choice) = session.archive_choice() else {
            return Ok(ArchiveOutcome::NotFinished);
        };
        if !save {
            tracing::info!(title = %session.title(), "Player declined to archive");
            return Ok(ArchiveOutcome::Discarded);
        }

        let artifact = match session.last_artifact() {
            Some(artifact) => artifact.to_string(),
            None => self.compose_artifact(session, choice).await?,
        };
        let record = ArchiveRecord::from_session(session, choice, artifact, Utc::now());

        match store.append(&record) {
            Ok(()) => Ok(ArchiveOutcome::Saved(record)),
            Err(e) => {
                tracing::warn!(title = %session.title(), "Failed to archive memory: {e}");
                Ok(ArchiveOutcome::SaveFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn generate(
        &self,
        level: Level,
        phase: TemplatePhase,
        context: String,
    ) -> Result<String, RitualError> {
        let template = select_template(level, phase);
        let request = template.request(context);
        let raw = self.client.generate(&request).await.inspect_err(|e| {
            tracing::warn!(level = level.number(), ?phase, "Generation failed: {e}");
        })?;
        Ok(template.shape.enforce(&raw))
    }

    async fn dialogue(&self, session: &RitualSession) -> Result<String, RitualError> {
        self.generate(session.level(), TemplatePhase::Dialogue, build_context(session))
            .await
    }

    async fn closing_sentence(&self, session: &RitualSession) -> Result<String, RitualError> {
        self.generate(session.level(), TemplatePhase::Closing, build_context(session))
            .await
    }

    async fn compose_artifact(
        &self,
        session: &RitualSession,
        choice: ArchiveChoice,
    ) -> Result<String, RitualError> {
        self.generate(
            session.level(),
            TemplatePhase::Artifact(choice),
            artifact_context(session),
        )
        .await
    }

    async fn play_round(&self, session: &mut RitualSession, reply: &str) -> Result<Turn, RitualError> {
        if !reply.is_empty() {
            session.push(HistoryEntry::Player(reply.to_string()));
        }

        let level = session.level();
        match session.round_step() {
            RoundStep::First => {
                session.anchor_at_end();
                let text = self.dialogue(session).await?;
                session.push(HistoryEntry::Pond(text.clone()));
                session.set_round_step(RoundStep::Second);
                Ok(Turn::new(level, PhaseLabel::RoundOne, text))
            }
            RoundStep::Second => {
                let text = self.dialogue(session).await?;
                session.push(HistoryEntry::Pond(text.clone()));
                session.set_round_step(RoundStep::Closing);
                Ok(Turn::new(level, PhaseLabel::RoundTwo, text))
            }
            RoundStep::Closing => self.close_level(session).await,
        }
    }

    async fn close_level(&self, session: &mut RitualSession) -> Result<Turn, RitualError> {
        let level = session.level();
        let closing = self.closing_sentence(session).await?;
        session.push(HistoryEntry::Pond(closing));

        let next = level.next();
        let next_name = next.map_or(ARCHIVING_STAGE, Level::name);
        let transition = self
            .generate(level, TemplatePhase::Transition, transition_context(session, next_name))
            .await?;
        session.push(HistoryEntry::Pond(transition.clone()));
        session.record_synthesis(LevelSynthesis::new(level.name(), transition.clone()));

        let invite = if let Some(next) = next {
            session.set_phase(Phase::AwaitingLevelDecision);
            tracing::info!(level = level.number(), "Level closed, awaiting decision");
            next_level_invite(next)
        } else {
            session.set_phase(Phase::AwaitingArchiveChoice);
            tracing::info!(level = level.number(), "Final level closed, awaiting archive choice");
            ARCHIVE_PROMPT.to_string()
        };
        Ok(Turn::new(level, PhaseLabel::Transition, format!("{transition}\n\n{invite}")))
    }

    async fn decide_level(&self, session: &mut RitualSession, reply: &str) -> Result<Turn, RitualError> {
        let level = session.level();
        match classify_continuation(reply) {
            Continuation::Continue => {
                let Some(next) = level.next() else {
                    return Ok(Turn::new(level, PhaseLabel::Synthesis, LEVEL_DECISION_REMINDER));
                };
                session.enter_level(next);
                tracing::info!(level = next.number(), "Entering level");
                let text = self.dialogue(session).await?;
                session.push(HistoryEntry::Pond(text.clone()));
                session.set_round_step(RoundStep::Second);
                Ok(Turn::new(next, PhaseLabel::RoundOne, text))
            }
            Continuation::Elaborate => {
                if !reply.is_empty() {
                    session.push(HistoryEntry::Player(reply.to_string()));
                }
                let closing = self.closing_sentence(session).await?;
                session.push(HistoryEntry::Pond(closing.clone()));
                Ok(Turn::new(level, PhaseLabel::Synthesis, format!("{closing}\n\n{LINGER_INVITE}")))
            }
            Continuation::Unrecognized => {
                Ok(Turn::new(level, PhaseLabel::Synthesis, LEVEL_DECISION_REMINDER))
            }
        }
    }

    async fn choose_disposition(
        &self,
        session: &mut RitualSession,
        reply: &str,
    ) -> Result<Turn, RitualError> {
        let level = session.level();
        let Some(choice) = classify_archive_choice(reply).choice() else {
            return Ok(Turn::new(level, PhaseLabel::Choice, ARCHIVE_REMINDER));
        };

        session.set_phase(Phase::Finished(choice));
        tracing::info!(%choice, "Ritual finished");
        let artifact = self.compose_artifact(session, choice).await?;
        session.push(HistoryEntry::Artifact(artifact.clone()));
        Ok(Turn::new(level, PhaseLabel::Artifact, artifact))
    }
}
