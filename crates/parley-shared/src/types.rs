use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

// Server-issued identifiers are opaque strings (document ids).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The other participant of a 1:1 conversation, as listed by the directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Peer {
    #[serde(rename = "_id", alias = "id")]
    pub id: PeerId,
    #[serde(rename = "fullName")]
    pub display_name: String,
    #[serde(rename = "profilePic", default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Peer {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(id),
            display_name: display_name.into(),
            avatar: None,
            bio: None,
        }
    }

    /// Avatar reference, treating the server's empty-string default as absent.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref().filter(|a| !a.is_empty())
    }
}

/// A single chat message.
///
/// Messages are immutable once stored, except for `seen`, which the engine
/// flips to `true` when the message arrives for the open conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id", alias = "id")]
    pub id: MessageId,
    pub sender_id: PeerId,
    #[serde(alias = "recipientId")]
    pub receiver_id: PeerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_from(&self, peer: &PeerId) -> bool {
        &self.sender_id == peer
    }

    /// 24-hour `HH:MM` label shown next to the bubble.
    pub fn time_label(&self) -> String {
        format_message_time(&self.created_at)
    }
}

pub fn format_message_time(at: &DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}

/// Body of an outgoing message: exactly one of text or image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    /// Image as a `data:image/...` URL; the server uploads it and stores the link.
    Image(String),
}

impl Payload {
    /// Build a text payload from raw input, trimming surrounding whitespace.
    pub fn text(input: &str) -> Result<Self, PayloadError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PayloadError::EmptyText);
        }
        Ok(Self::Text(trimmed.to_string()))
    }

    /// Build an image payload from a data URL read off a local file.
    pub fn image(data_url: impl Into<String>) -> Result<Self, PayloadError> {
        let data_url = data_url.into();
        if !data_url.starts_with("data:image/") {
            return Err(PayloadError::NotAnImage);
        }
        Ok(Self::Image(data_url))
    }
}
