//! Completion backend abstraction and the Gemini client.
//!
//! The responder only needs "text in, text out", so the seam is a single-method trait that
//! tests can stub.

mod gemini;

pub use gemini::{GeminiClient, GeminiError, DEFAULT_GEMINI_MODEL};

use async_trait::async_trait;

/// A generative text service: one prompt in, one answer out.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate an answer for `prompt`. Errors carry a human-readable cause.
    async fn complete(&self, prompt: &str) -> Result<String, String>;
}
