//! Gateway envelope parsing: unwrap `{"body": "<LINE JSON>"}` and normalize the first event.
//!
//! The hosting gateway wraps LINE's webhook body as a string under `body`. Only `events[0]` is
//! read; later events in the same delivery are dropped. Missing event fields are `None`, never
//! placeholder strings.

use crate::config::DeliveryMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw request from the hosting gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEnvelope {
    pub body: String,
}

impl GatewayEnvelope {
    /// Wrap a native LINE webhook body the way the hosting gateway does.
    pub fn wrap(line_body: &[u8]) -> Self {
        Self {
            body: String::from_utf8_lossy(line_body).into_owned(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| b"{}".to_vec())
    }
}

/// Where the reply goes: a single-use reply token or a user id for push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    ReplyToken(String),
    UserId(String),
}

impl ReplyTarget {
    pub fn as_str(&self) -> &str {
        match self {
            ReplyTarget::ReplyToken(s) | ReplyTarget::UserId(s) => s,
        }
    }
}

/// LINE `message.type`, reduced to what the composer distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Sticker,
    /// Any other type (image, file, audio, ...). Empty when `message.type` was absent.
    Other(String),
}

impl MessageKind {
    pub fn from_type(typ: Option<&str>) -> Self {
        match typ {
            Some("text") => MessageKind::Text,
            Some("sticker") => MessageKind::Sticker,
            Some(other) => MessageKind::Other(other.to_string()),
            None => MessageKind::Other(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Sticker => "sticker",
            MessageKind::Other(s) => s,
        }
    }
}

/// Normalized first event of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub reply_target: Option<ReplyTarget>,
    pub message_kind: MessageKind,
    /// Only set for text messages.
    pub text: Option<String>,
}

/// Result of a successful parse: an event, or a delivery without events (webhook verification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Event(ChatEvent),
    NoEvent,
}

/// Which JSON layer failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Outer,
    Inner,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Outer => f.write_str("gateway envelope"),
            Layer::Inner => f.write_str("line payload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("malformed {layer} json: {source}")]
    Parse {
        layer: Layer,
        #[source]
        source: serde_json::Error,
    },
    #[error("gateway envelope has no string 'body' field")]
    InvalidEnvelope,
}

/// Parse a gateway envelope and extract the first event.
/// `mode` selects the reply target: `replyToken` for reply, `source.userId` for push.
pub fn extract(raw: &[u8], mode: DeliveryMode) -> Result<Extraction, EnvelopeError> {
    let outer: Value = serde_json::from_slice(raw).map_err(|e| EnvelopeError::Parse {
        layer: Layer::Outer,
        source: e,
    })?;
    let body = outer
        .get("body")
        .and_then(Value::as_str)
        .ok_or(EnvelopeError::InvalidEnvelope)?;
    let payload: Value = serde_json::from_str(body).map_err(|e| EnvelopeError::Parse {
        layer: Layer::Inner,
        source: e,
    })?;

    let events = match payload.get("events").and_then(Value::as_array) {
        Some(events) if !events.is_empty() => events,
        Some(_) => {
            log::info!("envelope: events is empty (likely a webhook verification call)");
            return Ok(Extraction::NoEvent);
        }
        None => {
            log::info!("envelope: payload has no events array");
            return Ok(Extraction::NoEvent);
        }
    };
    if events.len() > 1 {
        log::debug!("envelope: dropping {} event(s) after the first", events.len() - 1);
    }
    Ok(Extraction::Event(event_from_value(&events[0], mode)))
}

fn event_from_value(event: &Value, mode: DeliveryMode) -> ChatEvent {
    let str_at = |path: &[&str]| -> Option<String> {
        let mut node = event;
        for key in path {
            node = node.get(*key)?;
        }
        node.as_str().map(str::to_string)
    };

    let reply_target = match mode {
        DeliveryMode::Reply => str_at(&["replyToken"]).map(ReplyTarget::ReplyToken),
        DeliveryMode::Push => str_at(&["source", "userId"]).map(ReplyTarget::UserId),
    }
    .filter(|t| !t.as_str().is_empty());

    let message_kind = MessageKind::from_type(str_at(&["message", "type"]).as_deref());
    let text = match message_kind {
        MessageKind::Text => str_at(&["message", "text"]),
        _ => None,
    };

    ChatEvent {
        reply_target,
        message_kind,
        text,
    }
}
