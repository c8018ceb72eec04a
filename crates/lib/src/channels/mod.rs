//! Outbound chat channels (LINE).
//!
//! The pipeline talks to a [`ReplyChannel`]; the LINE Messaging API client is the production
//! implementation.

mod line;

pub use line::{LineChannel, ReplyPayload, TextMessage, DEFAULT_LINE_API_BASE};

use crate::envelope::ReplyTarget;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("delivery rejected: {status} {body}")]
    Status { status: u16, body: String },
}

/// Sends one text reply to a target. Returns the HTTP status on success (2xx).
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Channel id (e.g. "line").
    fn id(&self) -> &str;

    async fn deliver(&self, target: &ReplyTarget, text: &str) -> Result<u16, DeliveryError>;
}
