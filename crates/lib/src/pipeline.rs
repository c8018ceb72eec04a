//! Processing stage: extract → compose → send, for one gateway envelope.
//!
//! Every failure is logged and folded into a [`ProcessOutcome`]; nothing here returns an error
//! to the webhook caller.

use crate::channels::{LineChannel, ReplyChannel};
use crate::composer::ReplyComposer;
use crate::config::{Config, Credentials, DeliveryMode};
use crate::envelope::{self, Extraction};
use crate::llm::GeminiClient;
use crate::responder::AiResponder;
use std::sync::Arc;

/// What happened to one envelope. Used for logs, the replay command, and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Reply accepted by the platform with this status.
    Delivered { status: u16 },
    /// Reply POST failed or was rejected.
    DeliveryFailed(String),
    /// Envelope was malformed or had no string body.
    Rejected(String),
    /// Delivery without events (webhook verification).
    NoEvent,
    /// Event had no usable reply token / user id.
    MissingTarget,
    /// Composer decided not to reply.
    Suppressed,
}

impl std::fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessOutcome::Delivered { status } => write!(f, "delivered ({})", status),
            ProcessOutcome::DeliveryFailed(e) => write!(f, "delivery failed: {}", e),
            ProcessOutcome::Rejected(e) => write!(f, "rejected: {}", e),
            ProcessOutcome::NoEvent => f.write_str("no event"),
            ProcessOutcome::MissingTarget => f.write_str("missing reply target"),
            ProcessOutcome::Suppressed => f.write_str("reply suppressed"),
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    delivery: DeliveryMode,
    composer: ReplyComposer,
    channel: Arc<dyn ReplyChannel>,
}

impl Pipeline {
    pub fn new(delivery: DeliveryMode, composer: ReplyComposer, channel: Arc<dyn ReplyChannel>) -> Self {
        Self {
            delivery,
            composer,
            channel,
        }
    }

    /// Production wiring: Gemini for completions, LINE for delivery.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Self {
        let gemini = &config.agents.gemini;
        let backend = GeminiClient::new(
            gemini.base_url.clone(),
            gemini.model.clone(),
            credentials.gemini_api_key.clone(),
        );
        log::info!("pipeline: using gemini model {}", backend.model());
        let composer = ReplyComposer::new(AiResponder::new(Arc::new(backend)), gemini.on_failure);
        let line = &config.channels.line;
        let channel = LineChannel::new(credentials.line_access_token.clone(), line.api_base.clone());
        Self::new(line.delivery, composer, Arc::new(channel))
    }

    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    pub async fn process(&self, raw: &[u8]) -> ProcessOutcome {
        log::info!("pipeline: processing envelope ({} bytes)", raw.len());
        let event = match envelope::extract(raw, self.delivery) {
            Ok(Extraction::Event(event)) => event,
            Ok(Extraction::NoEvent) => return ProcessOutcome::NoEvent,
            Err(e) => {
                log::warn!("pipeline: {}", e);
                return ProcessOutcome::Rejected(e.to_string());
            }
        };
        let Some(target) = event.reply_target else {
            log::warn!(
                "pipeline: no usable {} in event, dropping message",
                match self.delivery {
                    DeliveryMode::Reply => "replyToken",
                    DeliveryMode::Push => "source.userId",
                }
            );
            return ProcessOutcome::MissingTarget;
        };
        log::info!("pipeline: event kind={}", event.message_kind.as_str());
        log::debug!("pipeline: reply target {}", target.as_str());

        let Some(reply) = self
            .composer
            .compose(&event.message_kind, event.text.as_deref())
            .await
        else {
            return ProcessOutcome::Suppressed;
        };

        match self.channel.deliver(&target, &reply).await {
            Ok(status) => {
                log::info!("pipeline: {} accepted reply with status {}", self.channel.id(), status);
                ProcessOutcome::Delivered { status }
            }
            Err(e) => {
                log::warn!("pipeline: {} delivery failed: {}", self.channel.id(), e);
                ProcessOutcome::DeliveryFailed(e.to_string())
            }
        }
    }
}
