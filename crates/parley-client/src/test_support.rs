//! Scripted collaborators for the engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use parley_net::{ChannelConnection, Connection, EventHandler, NetError, PushFrame, RequestClient};
use parley_shared::{Message, MessageId, Peer, PeerId};

enum Reply {
    Value(Value),
    Fail(String),
    Gated(oneshot::Receiver<()>, Value),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub verb: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Request client answering from per-route queues of canned replies.
/// Unscripted routes fail like an unreachable server.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, verb: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(format!("{verb} {path}"))
            .or_default()
            .push_back(reply);
    }

    pub fn reply(&self, verb: &str, path: &str, value: Value) {
        self.push(verb, path, Reply::Value(value));
    }

    pub fn fail(&self, verb: &str, path: &str, reason: &str) {
        self.push(verb, path, Reply::Fail(reason.to_string()));
    }

    /// Queue a reply that is only delivered once the returned sender fires.
    pub fn reply_gated(&self, verb: &str, path: &str, value: Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(verb, path, Reply::Gated(rx, value));
        tx
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, verb: &str, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.verb == verb && r.path == path)
            .count()
    }

    async fn answer(&self, verb: &'static str, path: &str, body: Option<Value>) -> Result<Value, NetError> {
        self.requests.lock().unwrap().push(Request {
            verb,
            path: path.to_string(),
            body,
        });

        let key = format!("{verb} {path}");
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|q| q.pop_front());

        match reply {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::Fail(reason)) => Err(NetError::Unavailable(reason)),
            Some(Reply::Gated(gate, value)) => {
                let _ = gate.await;
                Ok(value)
            }
            None => Err(NetError::Unavailable(format!("no scripted reply for {key}"))),
        }
    }
}

#[async_trait]
impl RequestClient for ScriptedClient {
    async fn get(&self, path: &str) -> Result<Value, NetError> {
        self.answer("GET", path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, NetError> {
        self.answer("POST", path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, NetError> {
        self.answer("PUT", path, body).await
    }
}

/// [`ChannelConnection`] that counts handler registrations.
pub(crate) struct CountingConnection {
    pub inner: ChannelConnection,
    pub on_calls: AtomicUsize,
    pub off_calls: AtomicUsize,
}

impl CountingConnection {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<PushFrame>) {
        let (inner, outbound) = ChannelConnection::new(16);
        let conn = Arc::new(Self {
            inner,
            on_calls: AtomicUsize::new(0),
            off_calls: AtomicUsize::new(0),
        });
        (conn, outbound)
    }

    pub fn ons(&self) -> usize {
        self.on_calls.load(Ordering::SeqCst)
    }

    pub fn offs(&self) -> usize {
        self.off_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for CountingConnection {
    fn id(&self) -> Uuid {
        self.inner.id()
    }

    fn on(&self, event: &str, handler: EventHandler) {
        self.on_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.on(event, handler);
    }

    fn off(&self, event: &str) {
        self.off_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.off(event);
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<(), NetError> {
        self.inner.emit(event, payload).await
    }
}

pub(crate) fn peer(id: &str, name: &str) -> Peer {
    Peer::new(id, name)
}

/// An unseen text message from `from` to the local user.
pub(crate) fn message(id: &str, from: &str) -> Message {
    Message {
        id: MessageId::new(id),
        sender_id: PeerId::new(from),
        receiver_id: PeerId::new("me"),
        text: Some(format!("hello from {from}")),
        image: None,
        seen: false,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

pub(crate) fn history_body(messages: &[Message]) -> Value {
    json!({ "success": true, "messages": messages })
}

/// Poll `cond` until it holds, failing the test after one second.
pub(crate) async fn wait_for<F: Fn() -> bool>(cond: F) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
