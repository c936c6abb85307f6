//! Ritual logic for Memory Pond.
//!
//! The crate turns player replies into pond responses:
//!
//! - [`ritual`] - the state machine ([`RitualEngine`]) driving a [`RitualSession`]
//! - [`prompts`] - instruction templates per level and phase
//! - [`context`] - the context message bundled with every request
//! - [`enforce`] / [`style`] - shape and style rules applied to generated text
//! - [`intent`] - classification of replies at decision points
//! - [`archive`] / [`store`] - saved memories and per-player session persistence

pub mod archive;
pub mod context;
pub mod enforce;
mod error;
pub mod intent;
pub mod prompts;
pub mod ritual;
pub mod session;
pub mod store;
pub mod style;

pub use archive::{ArchiveError, ArchiveOutcome, ArchiveRecord, ArchiveStore, JsonlArchive};
pub use context::build_context;
pub use enforce::{Shape, stance_clause};
pub use error::{RitualError, ValidationError};
pub use intent::{ArchiveIntent, Continuation, classify_archive_choice, classify_continuation};
pub use prompts::{InstructionTemplate, TemplatePhase, select_template};
pub use ritual::RitualEngine;
pub use session::{Phase, RitualSession, RoundStep};
pub use store::{JsonFileSessionStore, MemorySessionStore, SessionStore, StoreError};
pub use style::sanitize;
