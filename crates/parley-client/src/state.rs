//! Conversation state owned by the sync engine.
//!
//! [`ChatState`] groups the directory, the unseen table, the selection
//! pointer and the open conversation's messages so that every transition
//! touching more than one of them happens under a single lock. It performs
//! no I/O; the engine fetches and then applies results here.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use parley_shared::{Message, Peer, PeerId};
use parley_store::{Directory, MessageStore, UnseenCounts};

/// What a push-delivered message did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The message belongs to the open conversation: it was flagged seen and
    /// appended.
    Appended(Message),
    /// The message belongs to another conversation: its sender's badge went up.
    Counted { peer: PeerId, count: u32 },
}

#[derive(Debug, Default)]
pub struct ChatState {
    directory: Directory,
    unseen: UnseenCounts,
    selection: Option<Peer>,
    messages: MessageStore,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&Peer> {
        self.selection.as_ref()
    }

    pub fn selected_id(&self) -> Option<PeerId> {
        self.selection.as_ref().map(|p| p.id.clone())
    }

    pub fn is_selected(&self, peer: &PeerId) -> bool {
        self.selection.as_ref().is_some_and(|p| &p.id == peer)
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn unseen(&self) -> &UnseenCounts {
        &self.unseen
    }

    /// Move the selection pointer. Selecting a peer zeroes its badge in the
    /// same step; clearing the selection empties the message list.
    pub fn select(&mut self, peer: Option<Peer>) {
        match &peer {
            Some(p) => self.unseen.reset(&p.id),
            None => self.messages.clear(),
        }
        self.selection = peer;
    }

    /// Install a fetched directory and its unseen table together.
    pub fn apply_directory(&mut self, peers: Vec<Peer>, counts: HashMap<PeerId, u32>) {
        self.directory.replace(peers);
        self.unseen.replace(counts);
        if let Some(selected) = &self.selection {
            self.unseen.reset(&selected.id);
        }
    }

    /// Replace the message list with `target`'s history, unless the user has
    /// navigated elsewhere since the fetch was issued. Returns whether the
    /// list was applied.
    pub fn apply_history(&mut self, target: &PeerId, messages: Vec<Message>) -> bool {
        if !self.is_selected(target) {
            return false;
        }
        self.messages.replace(messages);
        true
    }

    /// Append a message we sent to `target`, under the same selection check
    /// as [`apply_history`](Self::apply_history).
    pub fn apply_sent(&mut self, target: &PeerId, message: Message) -> bool {
        if !self.is_selected(target) {
            return false;
        }
        self.messages.append(message);
        true
    }

    /// Classify a pushed message against the current selection.
    pub fn apply_push(&mut self, mut message: Message) -> PushOutcome {
        if self.selection.as_ref().is_some_and(|p| message.is_from(&p.id)) {
            message.seen = true;
            self.messages.append(message.clone());
            PushOutcome::Appended(message)
        } else {
            let count = self.unseen.increment(&message.sender_id);
            PushOutcome::Counted {
                peer: message.sender_id,
                count,
            }
        }
    }

    /// Sidebar rows whose display name contains `query`, ignoring case. A
    /// blank query matches every peer.
    pub fn search(&self, query: &str, online: &HashSet<PeerId>) -> Vec<PeerView> {
        self.directory
            .search(query)
            .into_iter()
            .map(|peer| self.peer_view(peer, online))
            .collect()
    }

    pub fn snapshot(&self, online: &HashSet<PeerId>) -> ChatSnapshot {
        let peers = self
            .directory
            .peers()
            .iter()
            .map(|peer| self.peer_view(peer, online))
            .collect();

        ChatSnapshot {
            peers,
            messages: self.messages.messages().to_vec(),
            selected: self.selection.clone(),
            total_unseen: self.unseen.total(),
        }
    }

    fn peer_view(&self, peer: &Peer, online: &HashSet<PeerId>) -> PeerView {
        PeerView {
            online: online.contains(&peer.id),
            unseen: self.unseen.get(&peer.id),
            selected: self.is_selected(&peer.id),
            peer: peer.clone(),
        }
    }
}

/// Sidebar row: a directory peer decorated with presence and badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerView {
    pub peer: Peer,
    pub online: bool,
    pub unseen: u32,
    pub selected: bool,
}

/// Read-only copy of everything the UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub peers: Vec<PeerView>,
    pub messages: Vec<Message>,
    pub selected: Option<Peer>,
    pub total_unseen: u64,
}
