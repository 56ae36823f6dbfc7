//! Conversation-state synchronization for the Parley chat client.
//!
//! The [`SyncEngine`] keeps the conversation directory, per-peer unseen
//! counts, the open conversation and its messages consistent while requests
//! to the history API and frames from the push connection complete in any
//! order. A [`Session`] supplies the request client and connection handle it
//! is built from.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use engine::{HistoryOutcome, SyncEngine};
pub use error::SyncError;
pub use events::EngineEvent;
pub use session::{Presence, Session};
pub use state::{ChatSnapshot, ChatState, PeerView, PushOutcome};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("parley_client=debug,parley_net=debug,parley_store=info,warn")
    });

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting {} sync engine", parley_shared::constants::APP_NAME);
    }
}
