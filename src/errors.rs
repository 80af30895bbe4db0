//! Error kinds for leaderboard refreshes.
//!
//! A failing upstream must never take down the serving process; the cache
//! keeps serving the previous snapshot and only a cold cache surfaces one
//! of these to the HTTP layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// The upstream source could not be reached, answered with a
    /// non-success status, or no source is configured for the iteration.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The upstream answered but the body was not the expected JSON shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}
