use serde::Serialize;
use tokio::sync::broadcast;

use parley_shared::{MessageId, PeerId};

/// Notifications the engine publishes to the UI layer.
///
/// `Error` is the single channel through which user-facing failures are
/// surfaced; the other variants tell the UI which part of the snapshot to
/// re-read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    DirectoryLoaded { peers: usize },
    SelectionChanged { peer: Option<PeerId> },
    HistoryLoaded { peer: PeerId, count: usize },
    MessageAppended { peer: PeerId, message_id: MessageId },
    UnseenChanged { peer: PeerId, count: u32 },
    Error { message: String },
}

pub fn emit_event(tx: &broadcast::Sender<EngineEvent>, event: EngineEvent) {
    // Err only means nobody is listening right now.
    if tx.send(event).is_err() {
        tracing::trace!("No UI listener for engine event");
    }
}
