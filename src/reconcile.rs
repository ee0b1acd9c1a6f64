// Snapshot reconciliation: compares the previously accepted snapshot to a
// newly fetched one and emits semantic events in a fixed order. Pure state
// comparison, no I/O. Missing or malformed feed fields arrive here already
// defaulted, so they diff as "no change" instead of erroring.

use tracing::debug;

use crate::model::{Base, Destination, InningKey, Snapshot};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A semantic change derived from two successive snapshots.
///
/// Events are emitted in a fixed order (InningTurn, Out, BaseChange,
/// RunnerMove, Count, Matchup) so a reset implied by `Out` is applied
/// before any same-tick base occupancy changes, and a stale base is never
/// redrawn after a reset.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The (inning, half) key changed.
    InningTurn { key: InningKey },
    /// Third out recorded; triggers an atomic base reset. Fired at most
    /// once per (inning, half) key.
    Out { outs: u8 },
    /// A base's occupancy flipped, or its owning team changed.
    BaseChange {
        base: Base,
        occupied: bool,
        team: Option<String>,
    },
    /// A runner moved between two known endpoints; drives an animated
    /// transition instead of an instant clear/spawn pair.
    RunnerMove {
        from: Base,
        to: Destination,
        team: Option<String>,
    },
    /// Ball or strike count changed. Values are clamped for display.
    Count { balls: u8, strikes: u8 },
    /// Batter or pitcher changed.
    Matchup {
        batter: Option<String>,
        pitcher: Option<String>,
    },
    /// The feed could not be reached; the last-known state is stale.
    FeedLost,
}

/// Clamp a raw ball count for display. Four balls is the boundary condition
/// preceding a count reset and shows as 0, not as an out-of-range number.
pub fn clamp_balls(raw: u8) -> u8 {
    if raw >= 4 {
        0
    } else {
        raw
    }
}

/// Clamp a raw strike count for display. Three strikes shows as 0.
pub fn clamp_strikes(raw: u8) -> u8 {
    if raw >= 3 {
        0
    } else {
        raw
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Diffs successive snapshots into [`Event`]s.
///
/// Holds the single piece of cross-diff state: the (inning, half) key at
/// which the last third-out reset fired, guaranteeing the reset triggers
/// exactly once per half-inning even when several consecutive polls all
/// report three outs before the feed advances.
#[derive(Debug, Default)]
pub struct Reconciler {
    last_reset: Option<InningKey>,
}

impl Reconciler {
    pub fn new() -> Self {
        Reconciler::default()
    }

    /// Compare `previous` to `current` and return the ordered event list.
    ///
    /// With `previous == None` the current snapshot seeds the display:
    /// occupied bases, count, and matchup are all emitted as changes.
    pub fn diff(&mut self, previous: Option<&Snapshot>, current: &Snapshot) -> Vec<Event> {
        let mut events = Vec::new();

        let key = current.inning_key();
        let turned = previous.map(|p| p.inning_key()) != Some(key);
        if turned {
            events.push(Event::InningTurn { key });
        }

        if current.outs >= 3 && self.last_reset != Some(key) {
            self.last_reset = Some(key);
            events.push(Event::Out { outs: current.outs });
        }

        self.diff_bases(previous, current, turned, &mut events);

        let count_changed = previous
            .is_none_or(|p| p.balls != current.balls || p.strikes != current.strikes);
        if count_changed {
            events.push(Event::Count {
                balls: clamp_balls(current.balls),
                strikes: clamp_strikes(current.strikes),
            });
        }

        let matchup_changed = match previous {
            Some(p) => p.batter != current.batter || p.pitcher != current.pitcher,
            None => current.batter.is_some() || current.pitcher.is_some(),
        };
        if matchup_changed {
            events.push(Event::Matchup {
                batter: current.batter.clone(),
                pitcher: current.pitcher.clone(),
            });
        }

        events
    }

    /// Diff base occupancy into clears, arrivals, and inferred moves.
    ///
    /// The feed reports occupancy, not movement, so moves are inferred: a
    /// base vacated alongside a forward base newly occupied by the same team
    /// becomes a `RunnerMove`; a vacated base with no forward destination
    /// while the batting team's run total grew becomes a move to Home.
    /// Inference is skipped across an inning turn, where occupancy changes
    /// belong to different batting teams.
    fn diff_bases(
        &self,
        previous: Option<&Snapshot>,
        current: &Snapshot,
        turned: bool,
        events: &mut Vec<Event>,
    ) {
        let mut vacated: Vec<Base> = Vec::new();
        let mut arrived: Vec<Base> = Vec::new();

        for base in Base::ALL {
            let prev = previous.map(|p| p.base(base));
            let cur = current.base(base);
            let was_occupied = prev.is_some_and(|o| o.occupied);

            match (was_occupied, cur.occupied) {
                (false, true) => arrived.push(base),
                (true, false) => vacated.push(base),
                (true, true) => {
                    // Same base occupied by a different team: a new occupancy.
                    if prev.is_some_and(|o| o.team != cur.team) {
                        arrived.push(base);
                    }
                }
                (false, false) => {}
            }
        }

        let mut moves: Vec<(Base, Destination)> = Vec::new();
        if !turned {
            let mut run_budget = previous
                .map(|p| current.batting_runs().saturating_sub(p.batting_runs()))
                .unwrap_or(0);

            // Lead runners first, so third base's runner claims "home" and
            // second's claims third, not the other way around.
            for from in [Base::Third, Base::Second, Base::First] {
                if !vacated.contains(&from) {
                    continue;
                }
                let forward: &[Base] = match from {
                    Base::First => &[Base::Second, Base::Third],
                    Base::Second => &[Base::Third],
                    Base::Third => &[],
                };
                let dest = forward
                    .iter()
                    .copied()
                    .find(|b| arrived.contains(b) && same_team(previous, from, current, *b));

                if let Some(to) = dest {
                    arrived.retain(|b| *b != to);
                    vacated.retain(|b| *b != from);
                    moves.push((from, Destination::Base(to)));
                } else if run_budget > 0 {
                    run_budget -= 1;
                    vacated.retain(|b| *b != from);
                    moves.push((from, Destination::Home));
                }
            }
        }

        for base in vacated {
            events.push(Event::BaseChange {
                base,
                occupied: false,
                team: None,
            });
        }
        for base in arrived {
            events.push(Event::BaseChange {
                base,
                occupied: true,
                team: current.base(base).team.clone(),
            });
        }
        for (from, to) in moves {
            debug!(?from, ?to, "inferred runner move");
            events.push(Event::RunnerMove {
                from,
                to,
                team: previous
                    .and_then(|p| p.base(from).team.clone())
                    .or_else(|| Some(current.batting_team().to_string())),
            });
        }
    }
}

/// True when the runner leaving `from` in the previous snapshot and the one
/// arriving at `to` in the current snapshot belong to the same team, or when
/// either side omits the team.
fn same_team(previous: Option<&Snapshot>, from: Base, current: &Snapshot, to: Base) -> bool {
    let leaving = previous.and_then(|p| p.base(from).team.as_deref());
    let arriving = current.base(to).team.as_deref();
    match (leaving, arriving) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
