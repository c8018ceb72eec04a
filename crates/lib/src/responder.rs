//! AI responder: send one text to the completion backend and report the outcome.
//!
//! Failures are returned as [`AiOutcome::Failed`], never as an error that aborts the pipeline;
//! the composer decides what the user sees.

use crate::llm::CompletionBackend;
use std::sync::Arc;

/// Outcome of one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Answer(String),
    /// The call failed; the string is the cause.
    Failed(String),
}

#[derive(Clone)]
pub struct AiResponder {
    backend: Arc<dyn CompletionBackend>,
}

impl AiResponder {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub async fn respond(&self, text: &str) -> AiOutcome {
        log::info!(
            "responder: sending message to {} ({} chars)",
            self.backend.name(),
            text.chars().count()
        );
        match self.backend.complete(text).await {
            Ok(answer) => {
                log::info!(
                    "responder: received answer from {} ({} chars)",
                    self.backend.name(),
                    answer.chars().count()
                );
                log::debug!("responder: answer: {}", answer);
                AiOutcome::Answer(answer)
            }
            Err(cause) => {
                log::warn!("responder: {} call failed: {}", self.backend.name(), cause);
                AiOutcome::Failed(cause)
            }
        }
    }
}
