//! Push connection seam and an in-process implementation.
//!
//! A [`Connection`] holds at most one handler per event name. The concrete
//! socket transport is external: it feeds server frames into the inbound side
//! of a [`PushTransport`] and drains the frames the client emits from the
//! outbound side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::error::{NetError, Result};

/// Callback invoked with the payload of every frame for its event name.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

#[async_trait]
pub trait Connection: Send + Sync {
    /// Identity of this handle. Two handles with the same id are the same
    /// live connection.
    fn id(&self) -> Uuid;

    /// Register `handler` for `event`, replacing any previous one.
    fn on(&self, event: &str, handler: EventHandler);

    /// Drop the handler for `event`, if any.
    fn off(&self, event: &str);

    async fn emit(&self, event: &str, payload: Value) -> Result<()>;
}

/// One event on the push channel, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    pub event: String,
    pub payload: Value,
}

impl PushFrame {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// The socket-facing half of a [`ChannelConnection`].
#[derive(Debug)]
pub struct PushTransport {
    /// Frames received from the server, to be dispatched to handlers.
    pub inbound: mpsc::Sender<PushFrame>,
    /// Frames emitted by the client, to be written to the socket.
    pub outbound: mpsc::Receiver<PushFrame>,
}

/// [`Connection`] backed by tokio channels.
#[derive(Clone)]
pub struct ChannelConnection {
    inner: Arc<Shared>,
}

struct Shared {
    id: Uuid,
    handlers: Mutex<HashMap<String, EventHandler>>,
    outbound: mpsc::Sender<PushFrame>,
}

impl ChannelConnection {
    /// Create a connection without a dispatch task. Inbound frames must be
    /// handed to [`deliver`](Self::deliver) by the caller.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PushFrame>) {
        let (outbound, outbound_rx) = mpsc::channel(buffer);
        let conn = Self {
            inner: Arc::new(Shared {
                id: Uuid::new_v4(),
                handlers: Mutex::new(HashMap::new()),
                outbound,
            }),
        };
        (conn, outbound_rx)
    }

    /// Create a connection and spawn the task that dispatches inbound frames
    /// to the registered handlers. The task ends once every inbound sender is
    /// dropped.
    pub fn spawn(buffer: usize) -> (Self, PushTransport) {
        let (conn, outbound) = Self::new(buffer);
        let (inbound, mut inbound_rx) = mpsc::channel::<PushFrame>(buffer);

        let dispatcher = conn.clone();
        tokio::spawn(async move {
            while let Some(frame) = inbound_rx.recv().await {
                dispatcher.deliver(&frame.event, frame.payload);
            }
            info!(connection = %dispatcher.inner.id, "Push dispatch loop ended");
        });

        (conn, PushTransport { inbound, outbound })
    }

    /// Invoke the handler for `event` with `payload`. Returns whether a
    /// handler was registered.
    pub fn deliver(&self, event: &str, payload: Value) -> bool {
        // Clone the handler out so it runs without the map locked; handlers
        // may call back into `on`/`off`.
        let handler = self.handlers().get(event).cloned();
        match handler {
            Some(handler) => {
                handler(payload);
                true
            }
            None => {
                trace!(event, "No handler registered, dropping frame");
                false
            }
        }
    }

    pub fn has_handler(&self, event: &str) -> bool {
        self.handlers().contains_key(event)
    }

    fn handlers(&self) -> MutexGuard<'_, HashMap<String, EventHandler>> {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChannelConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConnection")
            .field("id", &self.inner.id)
            .field("events", &self.handlers().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    fn id(&self) -> Uuid {
        self.inner.id
    }

    fn on(&self, event: &str, handler: EventHandler) {
        debug!(connection = %self.inner.id, event, "Registering push handler");
        self.handlers().insert(event.to_string(), handler);
    }

    fn off(&self, event: &str) {
        if self.handlers().remove(event).is_some() {
            debug!(connection = %self.inner.id, event, "Removed push handler");
        }
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        self.inner
            .outbound
            .send(PushFrame::new(event, payload))
            .await
            .map_err(|_| NetError::ConnectionClosed)
    }
}
