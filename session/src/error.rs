use thiserror::Error;

use client::ClientError;

/// Generic fallbacks shown when a failure carries no upstream message.
pub const TIMELINE_FETCH_FAILED: &str = "Network error while loading the universe timeline";
pub const SNAPSHOTS_FETCH_FAILED: &str = "Network error while loading snapshots";
pub const SNAPSHOT_CREATE_FAILED: &str = "Network error while creating the snapshot";
pub const COMPOSITION_FETCH_FAILED: &str = "Network error while loading the composition";
pub const BACKFILL_FAILED: &str = "Network error while running the backfill";

#[derive(Error, Debug)]
pub enum SessionError {
    /// The operation needs a bound universe and none was provided.
    #[error("no universe bound to this session")]
    MissingUniverse,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Human-readable message for a client failure, preferring the
/// upstream-supplied text over the generic fallback.
pub fn user_message(err: &ClientError, fallback: &str) -> String {
    match err {
        ClientError::Upstream(message) => message.clone(),
        ClientError::Transport(_) | ClientError::MissingPayload => fallback.to_string(),
    }
}
