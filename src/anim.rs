// Animation scheduler: the single writer of all mutable visual state.
//
// Owns every RunnerEntity and BaseState. The controller feeds it semantic
// events from the reconciler; `tick()` advances every in-flight animation by
// exactly one discrete step. There is no clock in here; all timing is in
// tick units, so a test drives the scheduler by calling `tick()` a known
// number of times.

use tracing::{debug, warn};

use crate::colors::{ColorTable, Rgb};
use crate::model::{Base, Destination};
use crate::reconcile::Event;

// ---------------------------------------------------------------------------
// Step counts
// ---------------------------------------------------------------------------

/// Ticks for a runner to travel between two bases.
pub const MOVE_STEPS: u32 = 4;

/// Ticks for a base fill to fade between colors.
pub const FADE_STEPS: u32 = 3;

/// Extra ticks for the shrink-out after a runner touches home.
pub const SCORE_STEPS: u32 = 3;

// ---------------------------------------------------------------------------
// Runner entities
// ---------------------------------------------------------------------------

/// Per-runner state machine, advanced one step per `tick()`.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerState {
    /// Standing on a base.
    Idle { base: Base },
    /// In flight between `from` and `to`.
    Transitioning {
        from: Base,
        to: Destination,
        step: u32,
        total: u32,
    },
    /// Touched home; shrinking out before permanent removal.
    ScoringOut { step: u32, total: u32 },
}

/// A runner marker on the diamond. Exists only between its spawn event and
/// its cleared/scored event; owned exclusively by [`AnimationScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerEntity {
    pub id: u64,
    pub color: Rgb,
    pub team: Option<String>,
    pub state: RunnerState,
}

impl RunnerEntity {
    /// Current position on the unit diamond, interpolated while in flight.
    pub fn position(&self) -> (f64, f64) {
        match &self.state {
            RunnerState::Idle { base } => base.diamond_position(),
            RunnerState::Transitioning {
                from,
                to,
                step,
                total,
            } => {
                let (x0, y0) = from.diamond_position();
                let (x1, y1) = to.diamond_position();
                let t = if *total == 0 {
                    1.0
                } else {
                    f64::from(*step) / f64::from(*total)
                };
                (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t)
            }
            RunnerState::ScoringOut { .. } => Destination::Home.diamond_position(),
        }
    }

    /// Draw scale: 1.0 normally, shrinking to 0 while scoring out.
    pub fn scale(&self) -> f64 {
        match &self.state {
            RunnerState::ScoringOut { step, total } => {
                if *total == 0 {
                    0.0
                } else {
                    1.0 - f64::from(*step) / f64::from(*total)
                }
            }
            _ => 1.0,
        }
    }

    fn is_idle_at(&self, base: Base) -> bool {
        self.state == RunnerState::Idle { base }
    }
}

// ---------------------------------------------------------------------------
// Base state
// ---------------------------------------------------------------------------

/// Fill-color fade for a base, independent of the runner occupying it.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeAnimation {
    pub from: Rgb,
    pub to: Rgb,
    pub step: u32,
    pub total: u32,
}

impl FadeAnimation {
    pub fn current(&self) -> Rgb {
        if self.total == 0 {
            return self.to;
        }
        self.from
            .lerp(self.to, f64::from(self.step) / f64::from(self.total))
    }
}

/// Per-base occupancy and fill color.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseState {
    pub occupied: bool,
    pub team: Option<String>,
    pub fill: Rgb,
    pub fade: Option<FadeAnimation>,
}

impl Default for BaseState {
    fn default() -> Self {
        BaseState {
            occupied: false,
            team: None,
            fill: Rgb::NEUTRAL_BASE,
            fade: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Single-threaded cooperative scheduler for all visual state.
pub struct AnimationScheduler {
    bases: [BaseState; 3],
    runners: Vec<RunnerEntity>,
    colors: ColorTable,
    next_id: u64,
}

impl AnimationScheduler {
    pub fn new(colors: ColorTable) -> Self {
        AnimationScheduler {
            bases: Default::default(),
            runners: Vec::new(),
            colors,
            next_id: 0,
        }
    }

    pub fn bases(&self) -> &[BaseState; 3] {
        &self.bases
    }

    pub fn runners(&self) -> &[RunnerEntity] {
        &self.runners
    }

    /// The runner standing on `base`, if any. In-flight runners don't count.
    pub fn runner_at(&self, base: Base) -> Option<&RunnerEntity> {
        self.runners.iter().find(|r| r.is_idle_at(base))
    }

    /// Apply a batch of reconciliation events. Events were emitted in reset-
    /// before-occupancy order, so applying them in sequence never redraws a
    /// stale base after a reset.
    pub fn apply_events(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::Out { .. } => self.reset(),
                Event::BaseChange {
                    base,
                    occupied: true,
                    team,
                } => self.occupy(*base, team.as_deref()),
                Event::BaseChange {
                    base,
                    occupied: false,
                    ..
                } => self.clear(*base),
                Event::RunnerMove { from, to, team } => {
                    self.move_runner(*from, *to, team.as_deref())
                }
                // Count, matchup, and inning labels render straight from the
                // snapshot; feed loss only flags staleness in the view.
                Event::InningTurn { .. }
                | Event::Count { .. }
                | Event::Matchup { .. }
                | Event::FeedLost => {}
            }
        }
    }

    /// Advance every in-flight animation by one step.
    pub fn tick(&mut self) {
        for slot in &mut self.bases {
            if let Some(fade) = &mut slot.fade {
                fade.step += 1;
                slot.fill = fade.current();
                if fade.step >= fade.total {
                    slot.fill = fade.to;
                    slot.fade = None;
                }
            }
        }

        // Landings are applied after the scan: a completed move spawns its
        // static successor through the same idempotent path as any spawn, so
        // a continuation landing on a base cleared mid-flight cannot
        // resurrect anything.
        let mut landings: Vec<(Base, Rgb, Option<String>)> = Vec::new();
        self.runners.retain_mut(|runner| match &mut runner.state {
            RunnerState::Idle { .. } => true,
            RunnerState::Transitioning {
                to, step, total, ..
            } => {
                *step += 1;
                if *step < *total {
                    return true;
                }
                match to {
                    Destination::Base(base) => {
                        landings.push((*base, runner.color, runner.team.clone()));
                        false
                    }
                    Destination::Home => {
                        runner.state = RunnerState::ScoringOut {
                            step: 0,
                            total: SCORE_STEPS,
                        };
                        true
                    }
                }
            }
            RunnerState::ScoringOut { step, total } => {
                *step += 1;
                *step < *total
            }
        });

        for (base, color, team) in landings {
            self.land(base, color, team);
        }
    }

    /// Clear all three bases' entities and fades in one call, never
    /// partially. In-flight transitions are removed, which cancels them.
    pub fn reset(&mut self) {
        debug!("resetting all bases");
        for slot in &mut self.bases {
            *slot = BaseState::default();
        }
        self.runners.clear();
    }

    /// Mark a base occupied: spawn a runner there if none exists (idempotent)
    /// and fade the base fill toward the owning team's color. An existing
    /// runner is recolored, which covers a same-base change of owning team.
    fn occupy(&mut self, base: Base, team: Option<&str>) {
        let color = self.colors.fill_for(team);
        let slot = &mut self.bases[base.index()];
        slot.occupied = true;
        slot.team = team.map(str::to_string);
        self.start_fade(base, color);

        match self.runners.iter().position(|r| r.is_idle_at(base)) {
            Some(idx) => {
                let runner = &mut self.runners[idx];
                runner.color = color;
                runner.team = team.map(str::to_string);
            }
            None => self.spawn(base, color, team.map(str::to_string)),
        }
    }

    /// Remove any runner at `base` and cancel its fade.
    fn clear(&mut self, base: Base) {
        self.runners.retain(|r| !r.is_idle_at(base));
        self.bases[base.index()] = BaseState::default();
    }

    /// Start an animated move. With no runner registered at `from`, recovers
    /// by spawning directly at the destination instead.
    fn move_runner(&mut self, from: Base, to: Destination, team: Option<&str>) {
        let Some(idx) = self.runners.iter().position(|r| r.is_idle_at(from)) else {
            warn!(?from, ?to, "move for unregistered runner; spawning at destination");
            if let Destination::Base(base) = to {
                self.occupy(base, team);
            }
            return;
        };

        self.runners[idx].state = RunnerState::Transitioning {
            from,
            to,
            step: 0,
            total: MOVE_STEPS,
        };
        self.bases[from.index()] = BaseState::default();
    }

    /// Restart the base's fill fade toward `target`. Superseding an in-flight
    /// fade starts from the current interpolated color, not the neutral one,
    /// so the fill never jumps.
    fn start_fade(&mut self, base: Base, target: Rgb) {
        let slot = &mut self.bases[base.index()];
        slot.fade = Some(FadeAnimation {
            from: slot.fill,
            to: target,
            step: 0,
            total: FADE_STEPS,
        });
    }

    fn spawn(&mut self, base: Base, color: Rgb, team: Option<String>) {
        self.next_id += 1;
        self.runners.push(RunnerEntity {
            id: self.next_id,
            color,
            team,
            state: RunnerState::Idle { base },
        });
    }

    /// Completion of a transition onto a numbered base. Re-checks occupancy:
    /// if the base was cleared (or taken) while the move was in flight, the
    /// landing spawns nothing it shouldn't.
    fn land(&mut self, base: Base, color: Rgb, team: Option<String>) {
        if self.runner_at(base).is_none() {
            self.spawn(base, color, team.clone());
        }
        let slot = &mut self.bases[base.index()];
        slot.occupied = true;
        slot.team = team;
        self.start_fade(base, color);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Base::{First, Second, Third};

    fn scheduler() -> AnimationScheduler {
        AnimationScheduler::new(ColorTable::builtin())
    }

    fn occupy_event(base: Base, team: &str) -> Event {
        Event::BaseChange {
            base,
            occupied: true,
            team: Some(team.to_string()),
        }
    }

    #[test]
    fn spawn_is_idempotent() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(First, "Detroit Tigers")]);
        let id = anim.runner_at(First).unwrap().id;

        anim.apply_events(&[occupy_event(First, "Detroit Tigers")]);
        assert_eq!(anim.runners().len(), 1);
        assert_eq!(anim.runner_at(First).unwrap().id, id);
    }

    #[test]
    fn occupy_starts_fade_toward_team_color() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(First, "Detroit Tigers")]);

        let team_fill = ColorTable::builtin().get("Detroit Tigers").fill;
        let slot = &anim.bases()[First.index()];
        assert!(slot.occupied);
        assert!(slot.fade.is_some());
        assert_eq!(slot.fill, Rgb::NEUTRAL_BASE);

        for _ in 0..FADE_STEPS {
            anim.tick();
        }
        let slot = &anim.bases()[First.index()];
        assert_eq!(slot.fill, team_fill);
        assert!(slot.fade.is_none());
    }

    #[test]
    fn superseded_fade_restarts_from_interpolated_color() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(First, "Detroit Tigers")]);
        anim.tick();
        let mid = anim.bases()[First.index()].fill;
        assert_ne!(mid, Rgb::NEUTRAL_BASE);

        anim.apply_events(&[occupy_event(First, "Boston Red Sox")]);
        let fade = anim.bases()[First.index()].fade.clone().unwrap();
        assert_eq!(fade.from, mid, "fade must restart from the current color");
    }

    #[test]
    fn move_advances_then_lands_as_static_runner() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(First, "Detroit Tigers")]);
        anim.apply_events(&[Event::RunnerMove {
            from: First,
            to: crate::model::Destination::Base(Second),
            team: Some("Detroit Tigers".into()),
        }]);

        // Source bookkeeping is released immediately.
        assert!(!anim.bases()[First.index()].occupied);
        assert!(anim.runner_at(First).is_none());
        assert!(anim.runner_at(Second).is_none());

        // Midway through, the runner sits between the two bases.
        anim.tick();
        anim.tick();
        let runner = &anim.runners()[0];
        let (x, y) = runner.position();
        let (x0, y0) = First.diamond_position();
        let (x1, y1) = Second.diamond_position();
        assert!((x - (x0 + x1) / 2.0).abs() < 1e-9);
        assert!((y - (y0 + y1) / 2.0).abs() < 1e-9);

        for _ in 2..MOVE_STEPS {
            anim.tick();
        }
        assert!(anim.runner_at(Second).is_some());
        assert!(anim.bases()[Second.index()].occupied);
        assert_eq!(anim.runners().len(), 1);
    }

    #[test]
    fn move_to_home_shrinks_out_and_removes_runner() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(Third, "Detroit Tigers")]);
        anim.apply_events(&[Event::RunnerMove {
            from: Third,
            to: crate::model::Destination::Home,
            team: Some("Detroit Tigers".into()),
        }]);

        for _ in 0..MOVE_STEPS {
            anim.tick();
        }
        // Touched home: still present, shrinking.
        assert_eq!(anim.runners().len(), 1);
        assert!(matches!(
            anim.runners()[0].state,
            RunnerState::ScoringOut { .. }
        ));

        anim.tick();
        assert!(anim.runners()[0].scale() < 1.0);

        for _ in 1..SCORE_STEPS {
            anim.tick();
        }
        assert!(anim.runners().is_empty());
    }

    #[test]
    fn move_without_registered_runner_spawns_at_destination() {
        let mut anim = scheduler();
        anim.apply_events(&[Event::RunnerMove {
            from: First,
            to: crate::model::Destination::Base(Second),
            team: Some("Detroit Tigers".into()),
        }]);
        assert!(anim.runner_at(Second).is_some());
        assert!(anim.bases()[Second.index()].occupied);
    }

    #[test]
    fn move_home_without_registered_runner_is_noop() {
        let mut anim = scheduler();
        anim.apply_events(&[Event::RunnerMove {
            from: Third,
            to: crate::model::Destination::Home,
            team: None,
        }]);
        assert!(anim.runners().is_empty());
    }

    #[test]
    fn reset_clears_everything_atomically() {
        let mut anim = scheduler();
        anim.apply_events(&[
            occupy_event(First, "Detroit Tigers"),
            occupy_event(Second, "Detroit Tigers"),
            occupy_event(Third, "Detroit Tigers"),
        ]);
        anim.apply_events(&[Event::Out { outs: 3 }]);

        assert!(anim.runners().is_empty());
        for base in Base::ALL {
            let slot = &anim.bases()[base.index()];
            assert!(!slot.occupied);
            assert!(slot.fade.is_none());
            assert_eq!(slot.fill, Rgb::NEUTRAL_BASE);
        }
    }

    #[test]
    fn reset_cancels_in_flight_transition() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(First, "Detroit Tigers")]);
        anim.apply_events(&[Event::RunnerMove {
            from: First,
            to: crate::model::Destination::Base(Second),
            team: Some("Detroit Tigers".into()),
        }]);
        anim.tick();

        anim.apply_events(&[Event::Out { outs: 3 }]);

        // Any number of later ticks: the cancelled move must not land.
        for _ in 0..(MOVE_STEPS + SCORE_STEPS + 4) {
            anim.tick();
        }
        assert!(anim.runners().is_empty());
        for base in Base::ALL {
            assert!(!anim.bases()[base.index()].occupied);
        }
    }

    #[test]
    fn clear_removes_runner_and_cancels_fade() {
        let mut anim = scheduler();
        anim.apply_events(&[occupy_event(Second, "Detroit Tigers")]);
        assert!(anim.bases()[Second.index()].fade.is_some());

        anim.apply_events(&[Event::BaseChange {
            base: Second,
            occupied: false,
            team: None,
        }]);
        let slot = &anim.bases()[Second.index()];
        assert!(!slot.occupied);
        assert!(slot.fade.is_none());
        assert_eq!(slot.fill, Rgb::NEUTRAL_BASE);
        assert!(anim.runner_at(Second).is_none());
    }

    #[test]
    fn ticks_without_animations_are_noops() {
        let mut anim = scheduler();
        for _ in 0..10 {
            anim.tick();
        }
        assert!(anim.runners().is_empty());
        assert_eq!(anim.bases()[0], BaseState::default());
    }

    #[test]
    fn count_and_matchup_events_do_not_touch_bases() {
        let mut anim = scheduler();
        anim.apply_events(&[
            Event::Count {
                balls: 2,
                strikes: 1,
            },
            Event::Matchup {
                batter: Some("A. Batter".into()),
                pitcher: None,
            },
            Event::FeedLost,
        ]);
        assert!(anim.runners().is_empty());
        assert_eq!(anim.bases()[0], BaseState::default());
    }
}
