//! Inbound webhook: signature check, payload model, and conversion into
//! the events the bot acts on.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Check `signature` against the body, keyed by the channel secret.
pub fn verify_signature(
    channel_secret: &[u8],
    body: &[u8],
    signature: &str,
) -> Result<(), WebhookError> {
    let expected = BASE64
        .decode(signature.trim())
        .map_err(|_| WebhookError::InvalidSignature)?;
    let mut mac =
        HmacSha256::new_from_slice(channel_secret).map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature)
}

/// Compute the signature LINE would send for `body`.
pub fn sign(channel_secret: &[u8], body: &[u8]) -> Result<String, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(channel_secret).map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

// ── Payload model ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Message {
        #[serde(rename = "replyToken")]
        reply_token: Option<String>,
        source: EventSource,
        message: MessageContent,
    },
    MemberJoined {
        #[serde(rename = "replyToken")]
        reply_token: Option<String>,
        source: EventSource,
        joined: JoinedMembers,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventSource {
    User {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Group {
        #[serde(rename = "groupId")]
        group_id: String,
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageContent {
    Text { id: String, text: String },
    Image { id: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
pub struct JoinedMembers {
    #[serde(default)]
    pub members: Vec<JoinedMember>,
}

#[derive(Debug, Deserialize)]
pub struct JoinedMember {
    #[serde(rename = "userId")]
    pub user_id: String,
}

// ── Inbound events ──────────────────────────────────────────────────

/// The events the bot reacts to. Everything else becomes `Ignored`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Text sent to the bot in a one-to-one chat.
    DirectText {
        reply_token: String,
        user_id: String,
        text: String,
    },
    /// Image sent to the bot in a one-to-one chat.
    DirectImage {
        reply_token: String,
        user_id: String,
        message_id: String,
    },
    /// Text posted in a group.
    GroupText {
        reply_token: String,
        group_id: String,
        text: String,
    },
    /// Members joined a group.
    MemberJoined {
        reply_token: String,
        group_id: String,
        user_ids: Vec<String>,
    },
    Ignored,
}

impl From<WebhookEvent> for InboundEvent {
    fn from(event: WebhookEvent) -> Self {
        match event {
            WebhookEvent::Message {
                reply_token: Some(reply_token),
                source,
                message,
            } => match (source, message) {
                (EventSource::User { user_id }, MessageContent::Text { text, .. }) => {
                    Self::DirectText {
                        reply_token,
                        user_id,
                        text,
                    }
                }
                (EventSource::User { user_id }, MessageContent::Image { id }) => {
                    Self::DirectImage {
                        reply_token,
                        user_id,
                        message_id: id,
                    }
                }
                (EventSource::Group { group_id, .. }, MessageContent::Text { text, .. }) => {
                    Self::GroupText {
                        reply_token,
                        group_id,
                        text,
                    }
                }
                _ => Self::Ignored,
            },
            WebhookEvent::MemberJoined {
                reply_token: Some(reply_token),
                source: EventSource::Group { group_id, .. },
                joined,
            } => Self::MemberJoined {
                reply_token,
                group_id,
                user_ids: joined.members.into_iter().map(|m| m.user_id).collect(),
            },
            _ => Self::Ignored,
        }
    }
}

impl InboundEvent {
    /// Short kind name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DirectText { .. } => "direct_text",
            Self::DirectImage { .. } => "direct_image",
            Self::GroupText { .. } => "group_text",
            Self::MemberJoined { .. } => "member_joined",
            Self::Ignored => "ignored",
        }
    }
}

/// Parse a webhook body into inbound events, in delivery order.
pub fn parse_events(body: &[u8]) -> Result<Vec<InboundEvent>, WebhookError> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;
    Ok(payload.events.into_iter().map(InboundEvent::from).collect())
}
