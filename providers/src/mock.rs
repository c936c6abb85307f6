//! Scripted generation client for deterministic tests.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{GenerationClient, GenerationError, GenerationFut, GenerationRequest};

/// Replays queued replies in order and records every request it receives.
///
/// Once the script runs out, further calls fail with [`GenerationError::Malformed`].
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedClient {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client whose every scripted call succeeds with the given texts.
    #[must_use]
    pub fn replying<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|text| Ok(text.into())))
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        lock(&self.replies).push_back(Ok(text.into()));
    }

    pub fn push_error(&self, error: GenerationError) {
        lock(&self.replies).push_back(Err(error));
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }

    /// Snapshot of every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<GenerationRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl GenerationClient for ScriptedClient {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerationFut<'a> {
        lock(&self.requests).push(request.clone());
        let reply = lock(&self.replies).pop_front().unwrap_or_else(|| {
            Err(GenerationError::Malformed(
                "no scripted response left".to_string(),
            ))
        });
        Box::pin(async move { reply })
    }
}
