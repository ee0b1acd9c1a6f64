// Game selection: given an already-fetched schedule, pick the live game,
// the most recent finished game, and the next scheduled game. Pure
// time-ordering logic, no network.

use chrono::{DateTime, Utc};

use crate::model::{GameRef, Phase};

/// The result of selecting from a schedule at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// A game currently in progress, if any.
    pub live: Option<GameRef>,
    /// The most recently started finished game with start time <= now.
    pub last: Option<GameRef>,
    /// The earliest game with start time >= now. Never the live game.
    pub next: Option<GameRef>,
}

impl Selection {
    /// True when the schedule yielded nothing at all to display.
    pub fn is_idle(&self) -> bool {
        self.live.is_none() && self.last.is_none() && self.next.is_none()
    }
}

/// Select at most one of {live, last, next} from `schedule` as of `now`.
///
/// The schedule is expected sorted ascending by start time (the feed client
/// guarantees this), but selection does not rely on it.
pub fn select(schedule: &[GameRef], now: DateTime<Utc>) -> Selection {
    let mut selection = Selection::default();

    for game in schedule {
        match game.phase {
            Phase::Live => {
                if selection.live.is_none() {
                    selection.live = Some(game.clone());
                }
            }
            Phase::Finished => {
                if game.start_time <= now {
                    let newer = selection
                        .last
                        .as_ref()
                        .is_none_or(|last| game.start_time > last.start_time);
                    if newer {
                        selection.last = Some(game.clone());
                    }
                }
            }
            Phase::Scheduled => {}
        }

        // A live game is excluded from being "next" even if its start time
        // is still in the future (feeds mark games live slightly early).
        if game.phase != Phase::Live && game.start_time >= now {
            let earlier = selection
                .next
                .as_ref()
                .is_none_or(|next| game.start_time < next.start_time);
            if earlier {
                selection.next = Some(game.clone());
            }
        }
    }

    selection
}
