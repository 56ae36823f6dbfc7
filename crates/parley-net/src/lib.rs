// Transport seams for the Parley client: an authenticated request client for
// the history API and a push connection for live events.

pub mod api;
pub mod client;
pub mod connection;
pub mod error;

pub use api::HistoryApi;
pub use client::{HttpClient, RequestClient};
pub use connection::{ChannelConnection, Connection, EventHandler, PushFrame, PushTransport};
pub use error::{NetError, Result};
