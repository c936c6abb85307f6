//! Error types for the ritual engine.

use thiserror::Error;

use pond_providers::GenerationError;

/// Input rejected before any state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("give the memory a short title first")]
    EmptyTitle,
}

/// Failure of a ritual operation.
///
/// A `Generation` error can leave the session partially advanced: the
/// player's reply is already in the transcript while the pond's answer is
/// not. Retrying the same operation appends the reply a second time.
#[derive(Debug, Error)]
pub enum RitualError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
