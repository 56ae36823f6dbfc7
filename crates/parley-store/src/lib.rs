//! # parley-store
//!
//! In-memory conversation state for the Parley client: the message list of
//! the open conversation, the peer directory, and the per-peer unseen
//! counters. Nothing here is persisted; the history API is the source of
//! truth and these structures are a session-scoped view of it.

pub mod directory;
pub mod messages;
pub mod unseen;

pub use directory::Directory;
pub use messages::MessageStore;
pub use unseen::UnseenCounts;
