//! Session context: the collaborators the engine is built from.
//!
//! A [`Session`] owns the authenticated request client, the current push
//! connection handle and the online-presence set fed by the server. Login and
//! token issuance happen elsewhere; the session is handed a token (through
//! [`ClientConfig`]) or a ready-made client.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use parley_net::{ChannelConnection, Connection, HttpClient, NetError, PushTransport, RequestClient};
use parley_shared::constants::EVENT_ONLINE_USERS;
use parley_shared::PeerId;

use crate::config::ClientConfig;

/// Ids of the users the server currently reports as connected.
#[derive(Debug, Clone, Default)]
pub struct Presence {
    online: Arc<RwLock<HashSet<PeerId>>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, ids: impl IntoIterator<Item = PeerId>) {
        let mut online = self.online.write().unwrap_or_else(PoisonError::into_inner);
        *online = ids.into_iter().collect();
    }

    pub fn clear(&self) {
        self.online
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_online(&self, peer: &PeerId) -> bool {
        self.online
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(peer)
    }

    pub fn snapshot(&self) -> HashSet<PeerId> {
        self.online
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub struct Session {
    client: Arc<dyn RequestClient>,
    connection: Option<Arc<dyn Connection>>,
    presence: Presence,
}

impl Session {
    pub fn new(client: Arc<dyn RequestClient>) -> Self {
        Self {
            client,
            connection: None,
            presence: Presence::new(),
        }
    }

    /// Build a session around an [`HttpClient`] configured from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, NetError> {
        let mut client = HttpClient::new(&config.server_url, config.request_timeout)?;
        if let Some(token) = &config.auth_token {
            client = client.with_auth(config.auth_header.clone(), token.clone());
        }
        info!(server = %client.base_url(), authenticated = config.auth_token.is_some(), "Session created");
        Ok(Self::new(Arc::new(client)))
    }

    pub fn client(&self) -> Arc<dyn RequestClient> {
        self.client.clone()
    }

    pub fn connection(&self) -> Option<Arc<dyn Connection>> {
        self.connection.clone()
    }

    pub fn presence(&self) -> Presence {
        self.presence.clone()
    }

    /// Install a new connection handle (or none, on disconnect) and return the
    /// previous one. Presence tracking moves to the new handle; the online set
    /// is emptied until the new connection reports it.
    ///
    /// Engines built from this session must be re-attached with the new
    /// handle (see `SyncEngine::attach`).
    pub fn set_connection(
        &mut self,
        connection: Option<Arc<dyn Connection>>,
    ) -> Option<Arc<dyn Connection>> {
        if let Some(old) = &self.connection {
            old.off(EVENT_ONLINE_USERS);
        }
        self.presence.clear();

        if let Some(conn) = &connection {
            let presence = self.presence.clone();
            conn.on(
                EVENT_ONLINE_USERS,
                Arc::new(move |payload| match serde_json::from_value::<Vec<PeerId>>(payload) {
                    Ok(ids) => {
                        debug!(count = ids.len(), "Online users updated");
                        presence.replace(ids);
                    }
                    Err(e) => warn!(error = %e, "Malformed online users payload"),
                }),
            );
            info!(connection = %conn.id(), "Session connected");
        } else {
            info!("Session disconnected");
        }

        std::mem::replace(&mut self.connection, connection)
    }

    /// Replace the connection with a fresh in-process [`ChannelConnection`]
    /// whose queues hold `buffer` frames (`ClientConfig::push_buffer`), and
    /// return its transport side for the socket task to drive. Must be called
    /// from within a tokio runtime.
    pub fn open_channel(&mut self, buffer: usize) -> PushTransport {
        let (conn, transport) = ChannelConnection::spawn(buffer.max(1));
        self.set_connection(Some(Arc::new(conn)));
        transport
    }
}
