//! LINE Messaging API: reply-by-token and push-by-user-id.

use crate::channels::{DeliveryError, ReplyChannel};
use crate::envelope::ReplyTarget;
use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
const REPLY_PATH: &str = "/v2/bot/message/reply";
const PUSH_PATH: &str = "/v2/bot/message/push";

/// One text message object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMessage {
    #[serde(rename = "type")]
    pub typ: String,
    pub text: String,
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            typ: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Request body for the reply or push endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyPayload {
    Reply {
        #[serde(rename = "replyToken")]
        reply_token: String,
        messages: Vec<TextMessage>,
    },
    Push {
        to: String,
        messages: Vec<TextMessage>,
    },
}

impl ReplyPayload {
    /// Single text message addressed to `target`; the target kind selects reply vs push.
    pub fn text(target: &ReplyTarget, text: &str) -> Self {
        let messages = vec![TextMessage::new(text)];
        match target {
            ReplyTarget::ReplyToken(token) => ReplyPayload::Reply {
                reply_token: token.clone(),
                messages,
            },
            ReplyTarget::UserId(user_id) => ReplyPayload::Push {
                to: user_id.clone(),
                messages,
            },
        }
    }

    fn path(&self) -> &'static str {
        match self {
            ReplyPayload::Reply { .. } => REPLY_PATH,
            ReplyPayload::Push { .. } => PUSH_PATH,
        }
    }
}

/// LINE channel client. The access token is injected at construction.
pub struct LineChannel {
    id: String,
    token: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(token: Option<String>, api_base: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_LINE_API_BASE.to_string());
        if token.is_none() {
            log::warn!("line channel: no access token configured; sends will be unauthenticated");
        }
        Self {
            id: "line".to_string(),
            token,
            api_base,
            client: reqwest::Client::new(),
        }
    }

    /// POST the payload to its endpoint. Non-2xx responses are errors carrying status and body.
    pub async fn send(&self, payload: &ReplyPayload) -> Result<u16, DeliveryError> {
        let url = format!("{}{}", self.api_base, payload.path());
        log::debug!(
            "line: sending {}",
            serde_json::to_string(payload).unwrap_or_default()
        );
        let mut req = self.client.post(&url).json(payload);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(status.as_u16())
    }
}

#[async_trait]
impl ReplyChannel for LineChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn deliver(&self, target: &ReplyTarget, text: &str) -> Result<u16, DeliveryError> {
        self.send(&ReplyPayload::text(target, text)).await
    }
}
