//! Conversation state synchronization engine.
//!
//! [`SyncEngine`] owns the [`ChatState`] and reconciles it with two
//! unordered sources: request/response calls to the history API, and
//! `newMessage` frames arriving on the push connection.
//!
//! Ordering rules:
//! - state is only touched under one mutex that is never held across an
//!   `.await`, so each transition is atomic with respect to every other;
//! - the push handler is registered once per connection handle and reads the
//!   selection from the shared state on every frame;
//! - history and send completions capture their target peer when issued and
//!   are dropped if the selection has moved on by the time they resolve;
//! - mark-seen and the `sendMessage` echo run as detached tasks whose
//!   failures are logged and never reach the caller.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use parley_net::{Connection, EventHandler, HistoryApi, RequestClient};
use parley_shared::constants::{EVENT_NEW_MESSAGE, EVENT_SEND_MESSAGE};
use parley_shared::{Message, MessageId, Payload, Peer, PeerId};

use crate::config::ClientConfig;
use crate::error::SyncError;
use crate::events::{emit_event, EngineEvent};
use crate::session::{Presence, Session};
use crate::state::{ChatSnapshot, ChatState, PeerView, PushOutcome};

/// Result of a history load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The fetched list replaced the message store.
    Applied { count: usize },
    /// The selection changed while the fetch was in flight; nothing applied.
    Discarded,
}

#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

struct Inner {
    api: HistoryApi,
    state: Mutex<ChatState>,
    link: Mutex<PushLink>,
    presence: Presence,
    events: broadcast::Sender<EngineEvent>,
}

#[derive(Default)]
struct PushLink {
    /// Current handle provided by the session.
    connection: Option<Arc<dyn Connection>>,
    /// Handle our `newMessage` handler is registered on, if any.
    bound: Option<Arc<dyn Connection>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn link(&self) -> MutexGuard<'_, PushLink> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SyncEngine {
    pub fn new(
        client: Arc<dyn RequestClient>,
        connection: Option<Arc<dyn Connection>>,
        presence: Presence,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                api: HistoryApi::new(client),
                state: Mutex::new(ChatState::new()),
                link: Mutex::new(PushLink {
                    connection,
                    bound: None,
                }),
                presence,
                events,
            }),
        }
    }

    /// Build an engine from the session's collaborators. The push handler is
    /// not registered until [`subscribe`](Self::subscribe) is called.
    pub fn from_session(session: &Session, config: &ClientConfig) -> Self {
        Self::new(
            session.client(),
            session.connection(),
            session.presence(),
            config.event_capacity,
        )
    }

    /// Subscribe to UI notifications, including surfaced errors.
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> ChatSnapshot {
        let online = self.inner.presence.snapshot();
        self.inner.state().snapshot(&online)
    }

    /// Sidebar search over the loaded directory.
    pub fn search_peers(&self, query: &str) -> Vec<PeerView> {
        let online = self.inner.presence.snapshot();
        self.inner.state().search(query, &online)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.state().messages().messages().to_vec()
    }

    pub fn selected(&self) -> Option<Peer> {
        self.inner.state().selection().cloned()
    }

    pub fn unseen_count(&self, peer: &PeerId) -> u32 {
        self.inner.state().unseen().get(peer)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Fetch the peer list and unseen table and install both together.
    pub async fn load_directory(&self) -> Result<(), SyncError> {
        let resp = match self.inner.api.conversations().await {
            Ok(resp) => resp,
            Err(source) => {
                return Err(self.surface(SyncError::Fetch {
                    what: "conversations",
                    source,
                }))
            }
        };

        let peers = resp.peers.len();
        self.inner
            .state()
            .apply_directory(resp.peers, resp.unseen_counts);

        info!(peers, "Directory loaded");
        self.emit(EngineEvent::DirectoryLoaded { peers });
        Ok(())
    }

    /// Open `peer`'s conversation (or close the current one with `None`).
    ///
    /// The selection moves and the peer's badge is zeroed immediately; the
    /// message list keeps the previous conversation until the history fetch
    /// resolves.
    pub async fn select_peer(&self, peer: Option<Peer>) -> Result<(), SyncError> {
        let target = peer.as_ref().map(|p| p.id.clone());
        self.inner.state().select(peer);

        debug!(peer = ?target, "Selection changed");
        self.emit(EngineEvent::SelectionChanged {
            peer: target.clone(),
        });

        match target {
            Some(id) => self.load_history(&id).await.map(|_| ()),
            None => Ok(()),
        }
    }

    /// Fetch the full history with `peer` and replace the message store with
    /// it, provided `peer` is still selected when the response arrives.
    pub async fn load_history(&self, peer: &PeerId) -> Result<HistoryOutcome, SyncError> {
        let messages = match self.inner.api.messages(peer).await {
            Ok(messages) => messages,
            Err(source) => {
                return Err(self.surface(SyncError::Fetch {
                    what: "messages",
                    source,
                }))
            }
        };

        let count = messages.len();
        let applied = self.inner.state().apply_history(peer, messages);
        if !applied {
            debug!(peer = %peer, "Selection moved on, discarding history");
            return Ok(HistoryOutcome::Discarded);
        }

        self.emit(EngineEvent::HistoryLoaded {
            peer: peer.clone(),
            count,
        });
        Ok(HistoryOutcome::Applied { count })
    }

    /// Send `payload` to `peer`.
    ///
    /// Does nothing and returns `Ok(None)` unless `peer` is the open
    /// conversation. On success the stored message is appended and echoed on
    /// the push connection in the background.
    pub async fn send(&self, peer: &PeerId, payload: Payload) -> Result<Option<Message>, SyncError> {
        if let Err(reason) = self.require_selected(peer) {
            debug!(peer = %peer, reason = %reason, "Ignoring send");
            return Ok(None);
        }

        let message = match self.inner.api.send(peer, &payload).await {
            Ok(message) => message,
            Err(source) => return Err(self.surface(SyncError::Send(source))),
        };

        let appended = self.inner.state().apply_sent(peer, message.clone());
        if appended {
            info!(peer = %peer, message = %message.id, "Message sent");
            self.emit(EngineEvent::MessageAppended {
                peer: peer.clone(),
                message_id: message.id.clone(),
            });
        } else {
            debug!(peer = %peer, message = %message.id, "Sent after navigating away, not appending");
        }

        self.spawn_echo(&message);
        Ok(Some(message))
    }

    /// Apply one `newMessage` push frame.
    ///
    /// Messages from the open conversation are flagged seen, appended, and
    /// acknowledged to the server in the background. Anything else bumps its
    /// sender's unseen count by one.
    pub fn on_push_message(&self, payload: Value) {
        let message: Message = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping malformed push message");
                return;
            }
        };

        let outcome = self.inner.state().apply_push(message);
        match outcome {
            PushOutcome::Appended(message) => {
                debug!(peer = %message.sender_id, message = %message.id, "Live message appended");
                self.emit(EngineEvent::MessageAppended {
                    peer: message.sender_id.clone(),
                    message_id: message.id.clone(),
                });
                self.spawn_mark_seen(message.id);
            }
            PushOutcome::Counted { peer, count } => {
                debug!(peer = %peer, count, "Unseen message counted");
                self.emit(EngineEvent::UnseenChanged { peer, count });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Push subscription
    // -----------------------------------------------------------------------

    /// Register the `newMessage` handler on the current connection handle.
    /// No-op without a connection or when already bound to this handle.
    pub fn subscribe(&self) {
        let mut link = self.inner.link();
        let Some(conn) = link.connection.clone() else {
            debug!("No connection, skipping push subscription");
            return;
        };

        if let Some(bound) = &link.bound {
            if bound.id() == conn.id() {
                return;
            }
            bound.off(EVENT_NEW_MESSAGE);
        }

        conn.on(EVENT_NEW_MESSAGE, self.push_handler());
        info!(connection = %conn.id(), "Subscribed to push messages");
        link.bound = Some(conn);
    }

    /// Remove the `newMessage` handler. No-op when not subscribed.
    pub fn unsubscribe(&self) {
        if let Some(bound) = self.inner.link().bound.take() {
            bound.off(EVENT_NEW_MESSAGE);
            info!(connection = %bound.id(), "Unsubscribed from push messages");
        }
    }

    /// Switch to a new connection handle: deregister from the old one, then
    /// register on the new one. Re-attaching the current handle is a no-op.
    pub fn attach(&self, connection: Option<Arc<dyn Connection>>) {
        {
            let link = self.inner.link();
            let current = link.connection.as_ref().map(|c| c.id());
            if current == connection.as_ref().map(|c| c.id()) && link.bound.is_some() {
                return;
            }
        }

        self.unsubscribe();
        self.inner.link().connection = connection;
        self.subscribe();
    }

    /// Deregister and release the connection handle, returning it.
    pub fn detach(&self) -> Option<Arc<dyn Connection>> {
        self.unsubscribe();
        self.inner.link().connection.take()
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.link().bound.is_some()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn push_handler(&self) -> EventHandler {
        // Weak: the connection must not keep the engine alive.
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |payload| {
            if let Some(inner) = weak.upgrade() {
                SyncEngine { inner }.on_push_message(payload);
            }
        })
    }

    fn require_selected(&self, peer: &PeerId) -> Result<(), SyncError> {
        if self.inner.state().is_selected(peer) {
            Ok(())
        } else {
            Err(SyncError::NoActiveConversation)
        }
    }

    fn emit(&self, event: EngineEvent) {
        emit_event(&self.inner.events, event);
    }

    /// Report a user-facing failure once and hand it back to the caller.
    fn surface(&self, err: SyncError) -> SyncError {
        warn!(error = %err, "Operation failed");
        self.emit(EngineEvent::Error {
            message: err.to_string(),
        });
        err
    }

    fn spawn_mark_seen(&self, id: MessageId) {
        let api = self.inner.api.clone();
        spawn_detached("mark-seen", async move {
            if let Err(source) = api.mark_seen(&id).await {
                let err = SyncError::MarkSeen(source);
                warn!(message = %id, error = %err, "Server seen state lags");
            }
        });
    }

    fn spawn_echo(&self, message: &Message) {
        let Some(conn) = self.inner.link().connection.clone() else {
            return;
        };
        let payload = match serde_json::to_value(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode sent message for echo");
                return;
            }
        };

        spawn_detached("send-echo", async move {
            if let Err(e) = conn.emit(EVENT_SEND_MESSAGE, payload).await {
                warn!(connection = %conn.id(), error = %e, "Failed to echo sent message");
            }
        });
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("selected", &self.inner.state().selected_id())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

/// Fire-and-forget a background task on the current tokio runtime.
fn spawn_detached<F>(task: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(fut);
        }
        Err(_) => warn!(task, "No async runtime, skipping background task"),
    }
}
