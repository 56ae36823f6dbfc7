//! Types shared by every Parley crate: peer and message models, the send
//! payload, the JSON shapes of the history API and push channel, and the
//! route / event-name constants both sides agree on.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::PayloadError;
pub use types::{Message, MessageId, Payload, Peer, PeerId};
