use parley_shared::Message;
use serde::Serialize;
use tracing::debug;

/// Ordered message history of the open conversation.
///
/// The list is either replaced wholesale by a history fetch or grown one
/// message at a time by sends and push deliveries; it is never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole history with an authoritative fetched list.
    pub fn replace(&mut self, messages: Vec<Message>) {
        debug!(count = messages.len(), "Replacing message history");
        self.messages = messages;
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
