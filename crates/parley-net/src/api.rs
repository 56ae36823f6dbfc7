//! Typed routes of the history API on top of a [`RequestClient`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use parley_shared::constants::{messages_route, seen_route, ROUTE_CONVERSATIONS};
use parley_shared::protocol::{DirectoryResponse, Envelope, HistoryResponse, SendResponse};
use parley_shared::{Message, MessageId, Payload, PeerId};

use crate::client::RequestClient;
use crate::error::{NetError, Result};

#[derive(Clone)]
pub struct HistoryApi {
    client: Arc<dyn RequestClient>,
}

impl HistoryApi {
    pub fn new(client: Arc<dyn RequestClient>) -> Self {
        Self { client }
    }

    /// Peer list plus the server's unseen counts.
    pub async fn conversations(&self) -> Result<DirectoryResponse> {
        let value = self.client.get(ROUTE_CONVERSATIONS).await?;
        unwrap_envelope(value)
    }

    /// Full ordered history with `peer`.
    pub async fn messages(&self, peer: &PeerId) -> Result<Vec<Message>> {
        let value = self.client.get(&messages_route(peer.as_str())).await?;
        let resp: HistoryResponse = unwrap_envelope(value)?;
        debug!(peer = %peer, count = resp.messages.len(), "Fetched history");
        Ok(resp.messages)
    }

    /// Post a message to `peer` and return the stored copy.
    pub async fn send(&self, peer: &PeerId, payload: &Payload) -> Result<Message> {
        let body = serde_json::to_value(payload)?;
        let value = self
            .client
            .post(&messages_route(peer.as_str()), body)
            .await?;
        let resp: SendResponse = unwrap_envelope(value)?;
        Ok(resp.message)
    }

    pub async fn mark_seen(&self, id: &MessageId) -> Result<()> {
        let value = self.client.put(&seen_route(id.as_str()), None).await?;
        check_envelope(&value)
    }
}

fn check_envelope(value: &Value) -> Result<()> {
    let envelope = Envelope::deserialize(value)?;
    if envelope.success {
        Ok(())
    } else {
        Err(NetError::Rejected(
            envelope
                .failure_reason()
                .unwrap_or("Request was rejected by the server")
                .to_string(),
        ))
    }
}

fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T> {
    check_envelope(&value)?;
    Ok(serde_json::from_value(value)?)
}
