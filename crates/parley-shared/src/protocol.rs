//! JSON bodies exchanged with the history API.
//!
//! Every response is wrapped in an envelope `{ "success": bool, ... }`. On
//! failure the server adds a human-readable `message` string; on success the
//! remaining fields carry the payload described by the structs below.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Message, Peer, PeerId};

/// The envelope fields common to every response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    /// Only meaningful when `success` is false.
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl Envelope {
    /// Server-supplied failure reason, if it sent one as a string.
    pub fn failure_reason(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.as_str())
    }
}

/// `GET /conversations`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResponse {
    #[serde(alias = "users")]
    pub peers: Vec<Peer>,
    #[serde(default, alias = "unseenMessages")]
    pub unseen_counts: HashMap<PeerId, u32>,
}

/// `GET /conversations/{peerId}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
}

/// `POST /conversations/{peerId}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(alias = "newMessage")]
    pub message: Message,
}
