// Controller: the one-second cooperative tick that drives everything.
//
// The tick task owns all mutable state: reconciler, animation scheduler,
// previous snapshot, poll countdown. Network fetches run on a spawned
// worker (at most one in flight, enforced by the `in_flight` flag) and
// hand their result back through a single-slot mailbox that only the tick
// task reads, so reconciliation always sees a consistent previous/current
// pair and the renderer never observes a torn state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::anim::AnimationScheduler;
use crate::colors::ColorTable;
use crate::config::Config;
use crate::feed::Feed;
use crate::model::{GameRef, Snapshot};
use crate::poll::{PollPhase, PollScheduler};
use crate::protocol::{BaseView, RunnerView, UserCommand, ViewSnapshot};
use crate::reconcile::{Event, Reconciler};
use crate::record::Recorder;
use crate::select::{select, Selection};

// ---------------------------------------------------------------------------
// Fetch worker
// ---------------------------------------------------------------------------

/// What one round trip to the feed produced.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The schedule arrived; `snapshot` is present when a live game exists
    /// and its detail fetch succeeded. `detail_failed` distinguishes "no
    /// live game" from "live game but detail fetch failed".
    Schedule {
        schedule: Vec<GameRef>,
        snapshot: Option<Snapshot>,
        detail_failed: bool,
    },
    /// The schedule fetch itself failed.
    Failed { message: String },
}

/// One fetch round: schedule lookup, then live-detail lookup when a live
/// game exists. The selection run here is the same pure function the
/// controller uses; nothing mutable is shared across the boundary.
async fn fetch_once(feed: Arc<dyn Feed>, team_id: u32, lookahead_days: u32) -> FetchOutcome {
    let schedule = match feed.fetch_schedule(team_id, lookahead_days).await {
        Ok(schedule) => schedule,
        Err(e) => {
            return FetchOutcome::Failed {
                message: e.to_string(),
            }
        }
    };

    let live = select(&schedule, Utc::now()).live;
    let (snapshot, detail_failed) = match live {
        Some(game) => match feed.fetch_snapshot(game.game_id).await {
            Ok(snapshot) => (Some(snapshot), false),
            Err(e) => {
                warn!("live detail fetch failed: {e}");
                (None, true)
            }
        },
        None => (None, false),
    };

    FetchOutcome::Schedule {
        schedule,
        snapshot,
        detail_failed,
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the tick loop's state. Constructed once at startup and consumed by
/// [`run`].
pub struct Controller {
    config: Config,
    feed: Arc<dyn Feed>,
    reconciler: Reconciler,
    anim: AnimationScheduler,
    poll: PollScheduler,
    recorder: Option<Recorder>,
    previous: Option<Snapshot>,
    selection: Selection,
    /// Seconds until the next fetch is due.
    countdown: u64,
    /// True while a fetch worker is outstanding. A tick that would start a
    /// second fetch is a no-op.
    in_flight: bool,
    stale: bool,
    result_tx: mpsc::Sender<FetchOutcome>,
    result_rx: mpsc::Receiver<FetchOutcome>,
    ui_tx: mpsc::Sender<ViewSnapshot>,
}

impl Controller {
    pub fn new(
        config: Config,
        feed: Arc<dyn Feed>,
        colors: ColorTable,
        recorder: Option<Recorder>,
        ui_tx: mpsc::Sender<ViewSnapshot>,
    ) -> Self {
        // Single-slot mailbox: the worker writes, the tick task drains.
        let (result_tx, result_rx) = mpsc::channel(1);
        let poll = PollScheduler::new(config.polling.clone());
        Controller {
            config,
            feed,
            reconciler: Reconciler::new(),
            anim: AnimationScheduler::new(colors),
            poll,
            recorder,
            previous: None,
            selection: Selection::default(),
            countdown: 0,
            in_flight: false,
            stale: false,
            result_tx,
            result_rx,
            ui_tx,
        }
    }

    /// One tick: drain the mailbox, maybe dispatch a fetch, advance the
    /// animations, push a view. Returns false when the UI side is gone.
    async fn on_tick(&mut self) -> bool {
        while let Ok(outcome) = self.result_rx.try_recv() {
            self.handle_outcome(outcome, Utc::now());
        }

        if self.countdown > 0 {
            self.countdown -= 1;
        } else if !self.in_flight {
            self.dispatch_fetch();
        }

        self.anim.tick();

        self.ui_tx.send(self.build_view()).await.is_ok()
    }

    fn dispatch_fetch(&mut self) {
        self.in_flight = true;
        let feed = Arc::clone(&self.feed);
        let team_id = self.config.team_id;
        let lookahead_days = self.config.lookahead_days;
        let result_tx = self.result_tx.clone();
        tokio::spawn(async move {
            let outcome = fetch_once(feed, team_id, lookahead_days).await;
            if result_tx.send(outcome).await.is_err() {
                // Controller shut down while we were fetching; result is
                // discarded, per the shutdown contract.
                debug!("fetch result arrived after shutdown; discarding");
            }
        });
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome, now: DateTime<Utc>) {
        self.in_flight = false;
        match outcome {
            FetchOutcome::Failed { message } => {
                warn!("schedule fetch failed: {message}");
                self.stale = self.previous.is_some();
                self.anim.apply_events(&[Event::FeedLost]);
            }
            FetchOutcome::Schedule {
                schedule,
                snapshot,
                detail_failed,
            } => {
                self.selection = select(&schedule, now);
                match snapshot {
                    Some(snapshot) => self.accept_snapshot(snapshot),
                    None if detail_failed => {
                        // Keep the prior snapshot on screen, flagged stale.
                        self.stale = self.previous.is_some();
                        self.anim.apply_events(&[Event::FeedLost]);
                    }
                    None => {
                        self.stale = false;
                        if self.selection.live.is_none() {
                            debug!("no live game; showing schedule state");
                        }
                    }
                }
            }
        }

        self.countdown = self.poll.next_delay(self.poll_phase(now));
        debug!(countdown = self.countdown, "next poll scheduled");
    }

    fn accept_snapshot(&mut self, snapshot: Snapshot) {
        let events = self.reconciler.diff(self.previous.as_ref(), &snapshot);
        if !events.is_empty() {
            debug!(count = events.len(), "reconciled events");
        }
        self.anim.apply_events(&events);

        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.record_snapshot(&snapshot) {
                warn!("failed to record snapshot: {e}");
            }
        }

        self.previous = Some(snapshot);
        self.stale = false;
    }

    fn poll_phase(&self, now: DateTime<Utc>) -> PollPhase {
        if self.selection.live.is_some() {
            PollPhase::Live
        } else if let Some(next) = &self.selection.next {
            PollPhase::Scheduled {
                seconds_to_start: (next.start_time - now).num_seconds(),
            }
        } else {
            PollPhase::Idle
        }
    }

    fn build_view(&self) -> ViewSnapshot {
        let bases = std::array::from_fn(|i| {
            let slot = &self.anim.bases()[i];
            BaseView {
                occupied: slot.occupied,
                fill: slot.fill,
            }
        });
        let runners = self
            .anim
            .runners()
            .iter()
            .map(|r| RunnerView {
                position: r.position(),
                scale: r.scale(),
                color: r.color,
            })
            .collect();
        ViewSnapshot {
            snapshot: self.previous.clone(),
            selection: self.selection.clone(),
            runners,
            bases,
            seconds_to_next_poll: self.countdown,
            stale: self.stale,
        }
    }
}

/// Run the controller loop until the TUI quits or drops its channels.
pub async fn run(
    mut state: Controller,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
) -> anyhow::Result<()> {
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if !state.on_tick().await {
                    info!("UI channel closed; stopping controller");
                    break;
                }
            }
            cmd = cmd_rx.recv() => match cmd {
                Some(UserCommand::RefreshNow) => {
                    debug!("manual refresh requested");
                    state.countdown = 0;
                }
                Some(UserCommand::Quit) | None => break,
            }
        }
    }

    // Dropping `state` drops the mailbox receiver; an in-flight fetch
    // result now has nowhere to land and is discarded by the worker.
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedError;
    use crate::model::{BaseOccupancy, Half, Phase, TeamLine};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct ScriptedFeed {
        schedule: Vec<GameRef>,
        snapshot: Option<Snapshot>,
        fail_schedule: bool,
        fail_snapshot: bool,
    }

    #[async_trait]
    impl Feed for ScriptedFeed {
        async fn fetch_schedule(
            &self,
            _team_id: u32,
            _lookahead_days: u32,
        ) -> Result<Vec<GameRef>, FeedError> {
            if self.fail_schedule {
                return Err(FeedError::Malformed("scripted failure".into()));
            }
            Ok(self.schedule.clone())
        }

        async fn fetch_snapshot(&self, _game_id: u64) -> Result<Snapshot, FeedError> {
            if self.fail_snapshot {
                return Err(FeedError::Malformed("scripted failure".into()));
            }
            self.snapshot
                .clone()
                .ok_or_else(|| FeedError::Malformed("no snapshot scripted".into()))
        }
    }

    fn live_game(id: u64) -> GameRef {
        GameRef {
            game_id: id,
            start_time: Utc.with_ymd_and_hms(2025, 7, 4, 18, 0, 0).unwrap(),
            phase: Phase::Live,
            away: "Detroit Tigers".into(),
            home: "Cleveland Guardians".into(),
        }
    }

    fn live_snapshot(id: u64) -> Snapshot {
        Snapshot {
            game_id: id,
            status: "In Progress".into(),
            inning: 2,
            half: Half::Top,
            balls: 1,
            strikes: 0,
            outs: 0,
            bases: [
                BaseOccupancy::held_by("Detroit Tigers"),
                BaseOccupancy::empty(),
                BaseOccupancy::empty(),
            ],
            batter: Some("A. Batter".into()),
            pitcher: Some("P. Pitcher".into()),
            away: TeamLine {
                name: "Detroit Tigers".into(),
                ..TeamLine::default()
            },
            home: TeamLine {
                name: "Cleveland Guardians".into(),
                ..TeamLine::default()
            },
        }
    }

    fn controller(feed: Arc<dyn Feed>) -> (Controller, mpsc::Receiver<ViewSnapshot>) {
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let ctrl = Controller::new(
            Config::default(),
            feed,
            ColorTable::builtin(),
            None,
            ui_tx,
        );
        (ctrl, ui_rx)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 18, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn fetch_once_returns_schedule_and_live_snapshot() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![live_game(5)],
            snapshot: Some(live_snapshot(5)),
            fail_schedule: false,
            fail_snapshot: false,
        });
        let outcome = fetch_once(feed, 117, 7).await;
        match outcome {
            FetchOutcome::Schedule {
                schedule,
                snapshot,
                detail_failed,
            } => {
                assert_eq!(schedule.len(), 1);
                assert_eq!(snapshot.unwrap().game_id, 5);
                assert!(!detail_failed);
            }
            other => panic!("expected Schedule, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_once_schedule_failure_is_reported() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![],
            snapshot: None,
            fail_schedule: true,
            fail_snapshot: false,
        });
        let outcome = fetch_once(feed, 117, 7).await;
        assert!(matches!(outcome, FetchOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn fetch_once_detail_failure_keeps_schedule() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![live_game(5)],
            snapshot: None,
            fail_schedule: false,
            fail_snapshot: true,
        });
        let outcome = fetch_once(feed, 117, 7).await;
        match outcome {
            FetchOutcome::Schedule {
                schedule,
                snapshot,
                detail_failed,
            } => {
                assert_eq!(schedule.len(), 1);
                assert!(snapshot.is_none());
                assert!(detail_failed);
            }
            other => panic!("expected Schedule, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepted_snapshot_populates_animation_state() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![live_game(5)],
            snapshot: Some(live_snapshot(5)),
            fail_schedule: false,
            fail_snapshot: false,
        });
        let (mut ctrl, _ui_rx) = controller(feed);

        ctrl.handle_outcome(
            FetchOutcome::Schedule {
                schedule: vec![live_game(5)],
                snapshot: Some(live_snapshot(5)),
                detail_failed: false,
            },
            noon(),
        );

        assert!(ctrl.previous.is_some());
        assert!(!ctrl.stale);
        let view = ctrl.build_view();
        assert!(view.bases[0].occupied);
        assert_eq!(view.runners.len(), 1);
        // Live game: countdown uses the live interval.
        assert_eq!(ctrl.countdown, ctrl.config.polling.live_seconds);
    }

    #[tokio::test]
    async fn failed_fetch_marks_state_stale_and_keeps_snapshot() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![],
            snapshot: None,
            fail_schedule: true,
            fail_snapshot: false,
        });
        let (mut ctrl, _ui_rx) = controller(feed);

        ctrl.handle_outcome(
            FetchOutcome::Schedule {
                schedule: vec![live_game(5)],
                snapshot: Some(live_snapshot(5)),
                detail_failed: false,
            },
            noon(),
        );
        ctrl.handle_outcome(
            FetchOutcome::Failed {
                message: "network down".into(),
            },
            noon(),
        );

        assert!(ctrl.stale);
        assert!(ctrl.previous.is_some(), "prior snapshot must be retained");
        let view = ctrl.build_view();
        assert!(view.stale);
        assert_eq!(view.snapshot.unwrap().game_id, 5);
    }

    #[tokio::test]
    async fn failed_fetch_with_no_history_is_not_stale() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![],
            snapshot: None,
            fail_schedule: true,
            fail_snapshot: false,
        });
        let (mut ctrl, _ui_rx) = controller(feed);
        ctrl.handle_outcome(
            FetchOutcome::Failed {
                message: "network down".into(),
            },
            noon(),
        );
        // Nothing was ever shown, so nothing is "stale": this is the idle
        // no-data state.
        assert!(!ctrl.stale);
        assert!(ctrl.previous.is_none());
        assert_eq!(ctrl.countdown, ctrl.config.polling.idle_seconds);
    }

    #[tokio::test]
    async fn no_games_schedules_idle_poll() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![],
            snapshot: None,
            fail_schedule: false,
            fail_snapshot: false,
        });
        let (mut ctrl, _ui_rx) = controller(feed);
        ctrl.handle_outcome(
            FetchOutcome::Schedule {
                schedule: vec![],
                snapshot: None,
                detail_failed: false,
            },
            noon(),
        );
        assert!(ctrl.selection.is_idle());
        assert_eq!(ctrl.countdown, ctrl.config.polling.idle_seconds);
    }

    #[tokio::test]
    async fn future_game_schedules_pre_live_backoff() {
        let mut game = live_game(9);
        game.phase = Phase::Scheduled;
        game.start_time = noon() + chrono::Duration::hours(2);

        let feed = Arc::new(ScriptedFeed {
            schedule: vec![game.clone()],
            snapshot: None,
            fail_schedule: false,
            fail_snapshot: false,
        });
        let (mut ctrl, _ui_rx) = controller(feed);
        ctrl.handle_outcome(
            FetchOutcome::Schedule {
                schedule: vec![game],
                snapshot: None,
                detail_failed: false,
            },
            noon(),
        );
        // Two hours out, one-hour window: sleep the remaining hour.
        assert_eq!(ctrl.countdown, 3600);
    }

    /// A feed whose requests never complete; pins the in-flight flag.
    struct StalledFeed;

    #[async_trait]
    impl Feed for StalledFeed {
        async fn fetch_schedule(
            &self,
            _team_id: u32,
            _lookahead_days: u32,
        ) -> Result<Vec<GameRef>, FeedError> {
            std::future::pending().await
        }

        async fn fetch_snapshot(&self, _game_id: u64) -> Result<Snapshot, FeedError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn tick_dispatches_only_one_fetch_at_a_time() {
        let (mut ctrl, mut ui_rx) = controller(Arc::new(StalledFeed));

        assert!(ctrl.on_tick().await);
        assert!(ctrl.in_flight);
        let first_view = ui_rx.recv().await.unwrap();
        assert_eq!(first_view.seconds_to_next_poll, 0);

        // Countdown is still zero but a fetch is outstanding: a tick that
        // would start a second fetch is a no-op.
        assert!(ctrl.on_tick().await);
        assert!(ctrl.on_tick().await);
        assert!(ctrl.in_flight);
    }

    #[tokio::test]
    async fn view_is_read_only_projection() {
        let feed = Arc::new(ScriptedFeed {
            schedule: vec![],
            snapshot: None,
            fail_schedule: false,
            fail_snapshot: false,
        });
        let (mut ctrl, _ui_rx) = controller(feed);
        ctrl.handle_outcome(
            FetchOutcome::Schedule {
                schedule: vec![live_game(5)],
                snapshot: Some(live_snapshot(5)),
                detail_failed: false,
            },
            noon(),
        );

        let mut view = ctrl.build_view();
        view.bases[0].occupied = false;
        view.runners.clear();
        // Mutating the projection leaves controller state untouched.
        let fresh = ctrl.build_view();
        assert!(fresh.bases[0].occupied);
        assert_eq!(fresh.runners.len(), 1);
    }
}
