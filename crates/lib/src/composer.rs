//! Reply composer: choose the reply text for an event's message kind.

use crate::config::AiFailurePolicy;
use crate::envelope::MessageKind;
use crate::responder::{AiOutcome, AiResponder};

/// Reply to a sticker.
pub const STICKER_REPLY: &str = "スタンプありがとう";
/// Reply to images, files, and anything else that is not text or a sticker.
pub const FALLBACK_REPLY: &str = "ファイルはいやよ";
/// Reply to a text message whose text is missing or blank.
pub const EMPTY_TEXT_REPLY: &str = "なにか話しかけてね";
/// Reply when the completion call failed and the policy is [`AiFailurePolicy::Fallback`].
pub const AI_FAILURE_REPLY: &str = "ごめんね、今はうまく答えられないよ";

#[derive(Clone)]
pub struct ReplyComposer {
    responder: AiResponder,
    on_failure: AiFailurePolicy,
}

impl ReplyComposer {
    pub fn new(responder: AiResponder, on_failure: AiFailurePolicy) -> Self {
        Self {
            responder,
            on_failure,
        }
    }

    /// Reply text for this message, or None when nothing should be sent.
    /// Only non-empty text messages reach the responder.
    pub async fn compose(&self, kind: &MessageKind, text: Option<&str>) -> Option<String> {
        match kind {
            MessageKind::Text => match text.filter(|t| !t.trim().is_empty()) {
                Some(text) => {
                    let outcome = self.responder.respond(text).await;
                    self.resolve(outcome)
                }
                None => {
                    log::debug!("composer: text message without text");
                    Some(EMPTY_TEXT_REPLY.to_string())
                }
            },
            MessageKind::Sticker => Some(STICKER_REPLY.to_string()),
            MessageKind::Other(typ) => {
                log::debug!("composer: unsupported message type {:?}, using fallback", typ);
                Some(FALLBACK_REPLY.to_string())
            }
        }
    }

    fn resolve(&self, outcome: AiOutcome) -> Option<String> {
        match outcome {
            AiOutcome::Answer(answer) => Some(answer),
            AiOutcome::Failed(cause) => match self.on_failure {
                AiFailurePolicy::Fallback => Some(AI_FAILURE_REPLY.to_string()),
                AiFailurePolicy::Forward => Some(format!("Error: {}", cause)),
                AiFailurePolicy::Suppress => {
                    log::info!("composer: completion failed, reply suppressed");
                    None
                }
            },
        }
    }
}
