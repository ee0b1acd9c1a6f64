// Adaptive poll scheduling: how long to wait before the next fetch, based
// on game phase. Keeps a far-future game from burning fetches while still
// catching a game going live promptly.

use crate::config::PollingConfig;

/// What the poll delay is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// A game is in progress.
    Live,
    /// No live game, but one is scheduled; carries seconds until its start
    /// (negative once the start time has passed).
    Scheduled { seconds_to_start: i64 },
    /// No game known at all.
    Idle,
}

/// Computes the delay until the next fetch.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    config: PollingConfig,
}

impl PollScheduler {
    pub fn new(config: PollingConfig) -> Self {
        PollScheduler { config }
    }

    /// Seconds until the next fetch for the given phase.
    ///
    /// Live games poll at the short live interval. A scheduled game further
    /// out than the pre-live window sleeps until the window opens, then
    /// polls at the scheduled interval; once the start time passes, it is
    /// treated as about to go live. With no game known, the long idle
    /// interval applies.
    pub fn next_delay(&self, phase: PollPhase) -> u64 {
        let c = &self.config;
        match phase {
            PollPhase::Live => c.live_seconds,
            PollPhase::Scheduled { seconds_to_start } => {
                if seconds_to_start <= 0 {
                    c.live_seconds
                } else if seconds_to_start as u64 > c.pre_live_window_seconds {
                    c.scheduled_seconds
                        .max(seconds_to_start as u64 - c.pre_live_window_seconds)
                } else {
                    c.scheduled_seconds
                }
            }
            PollPhase::Idle => c.idle_seconds,
        }
    }
}
