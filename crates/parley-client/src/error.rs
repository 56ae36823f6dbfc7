use parley_net::NetError;
use thiserror::Error;

/// Failures of the sync engine's operations.
///
/// Every variant is scoped to the operation that produced it; none of them
/// leaves the owned state partially updated.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Directory or history load failed.
    #[error("Failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: NetError,
    },

    #[error("Failed to send message: {0}")]
    Send(#[source] NetError),

    /// Best-effort; logged, never surfaced to the user.
    #[error("Failed to mark message as seen: {0}")]
    MarkSeen(#[source] NetError),

    /// A send was attempted without the target conversation open. Sends in
    /// this state are ignored rather than reported.
    #[error("No active conversation")]
    NoActiveConversation,
}
