// Feed abstraction: fetches schedules and live game snapshots.
//
// The controller and tests talk to the `Feed` trait; `StatsApiFeed` is the
// production implementation against the MLB StatsAPI.

pub mod statsapi;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{GameRef, Snapshot};

pub use statsapi::StatsApiFeed;

/// Errors from the remote feed. All of them are non-fatal to the app: a
/// failed fetch is retried on the next scheduled poll and the last-known
/// snapshot stays on screen with a stale marker.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network failure, timeout, or HTTP error status.
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response decoded, but not into anything usable.
    #[error("malformed feed payload: {0}")]
    Malformed(String),
}

/// A point-in-time view of the remote feed. Implementations are stateless;
/// they may be slow or fail transiently, and the caller retries by polling.
#[async_trait]
pub trait Feed: Send + Sync {
    /// The schedule of games for a team from yesterday through
    /// `lookahead_days` ahead, ascending by start time.
    async fn fetch_schedule(
        &self,
        team_id: u32,
        lookahead_days: u32,
    ) -> Result<Vec<GameRef>, FeedError>;

    /// The current snapshot of one game.
    async fn fetch_snapshot(&self, game_id: u64) -> Result<Snapshot, FeedError>;
}
