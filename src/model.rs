// Core data model: feed snapshots, schedule entries, and the small enums
// shared by the reconciler, animation scheduler, and view layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Innings
// ---------------------------------------------------------------------------

/// Which half of the inning is being played. Top: the away team bats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Half {
    #[default]
    Top,
    Bottom,
}

impl Half {
    pub fn label(self) -> &'static str {
        match self {
            Half::Top => "Top",
            Half::Bottom => "Bot",
        }
    }
}

/// The (inning, half) pair. Orders chronologically, so it can serve as the
/// monotonically increasing key guarding the third-out reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct InningKey {
    pub inning: u8,
    pub half: Half,
}

impl InningKey {
    pub fn new(inning: u8, half: Half) -> Self {
        InningKey { inning, half }
    }
}

// ---------------------------------------------------------------------------
// Bases
// ---------------------------------------------------------------------------

/// A numbered base a runner can occupy. Home is not a base a runner rests on;
/// reaching it is terminal (see [`Destination`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    First,
    Second,
    Third,
}

impl Base {
    /// All bases in running order, first to third.
    pub const ALL: [Base; 3] = [Base::First, Base::Second, Base::Third];

    pub fn index(self) -> usize {
        match self {
            Base::First => 0,
            Base::Second => 1,
            Base::Third => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Base::First => "1B",
            Base::Second => "2B",
            Base::Third => "3B",
        }
    }

    /// Position of the base on a unit diamond. Home is at (0.5, 1.0);
    /// y grows downward so the diamond renders upright in a terminal.
    pub fn diamond_position(self) -> (f64, f64) {
        match self {
            Base::First => (1.0, 0.5),
            Base::Second => (0.5, 0.0),
            Base::Third => (0.0, 0.5),
        }
    }
}

/// Where a runner move ends up: a numbered base, or home (run scored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Base(Base),
    Home,
}

impl Destination {
    pub fn diamond_position(self) -> (f64, f64) {
        match self {
            Destination::Base(b) => b.diamond_position(),
            Destination::Home => (0.5, 1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Coarse game lifecycle bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Scheduled,
    Live,
    Finished,
}

/// One schedule entry: a game identifier plus its start time and phase.
/// Schedules are ordered ascending by start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRef {
    pub game_id: u64,
    pub start_time: DateTime<Utc>,
    pub phase: Phase,
    pub away: String,
    pub home: String,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Occupancy of a single base as reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseOccupancy {
    pub occupied: bool,
    /// Name of the team whose runner holds the base, when known.
    pub team: Option<String>,
}

impl BaseOccupancy {
    pub fn empty() -> Self {
        BaseOccupancy::default()
    }

    pub fn held_by(team: &str) -> Self {
        BaseOccupancy {
            occupied: true,
            team: Some(team.to_string()),
        }
    }
}

/// Run/hit/error totals for one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineTotals {
    pub runs: u32,
    pub hits: u32,
    pub errors: u32,
}

/// One team's row on the scoreboard: name, per-inning runs, and totals.
/// `innings[i]` is `None` when the inning has not been played (rendered "-").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamLine {
    pub name: String,
    pub innings: Vec<Option<u32>>,
    pub totals: LineTotals,
}

/// An immutable point-in-time state of one game, as fetched from the feed.
///
/// Two snapshots for the same `game_id` are comparable field-by-field; the
/// reconciler turns that comparison into semantic events. Only the latest
/// accepted snapshot is retained, as "previous" for the next diff.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub game_id: u64,
    /// Detailed status string from the feed (e.g. "In Progress").
    pub status: String,
    pub inning: u8,
    pub half: Half,
    pub balls: u8,
    pub strikes: u8,
    pub outs: u8,
    /// Indexed by `Base::index()`.
    pub bases: [BaseOccupancy; 3],
    pub batter: Option<String>,
    pub pitcher: Option<String>,
    pub away: TeamLine,
    pub home: TeamLine,
}

impl Snapshot {
    pub fn inning_key(&self) -> InningKey {
        InningKey::new(self.inning, self.half)
    }

    /// Name of the team currently batting (away bats in the top half).
    pub fn batting_team(&self) -> &str {
        match self.half {
            Half::Top => &self.away.name,
            Half::Bottom => &self.home.name,
        }
    }

    /// Run total of the team currently batting.
    pub fn batting_runs(&self) -> u32 {
        match self.half {
            Half::Top => self.away.totals.runs,
            Half::Bottom => self.home.totals.runs,
        }
    }

    pub fn base(&self, base: Base) -> &BaseOccupancy {
        &self.bases[base.index()]
    }
}
