// Shared types crossing the controller/TUI boundary.

use crate::colors::Rgb;
use crate::model::Snapshot;
use crate::select::Selection;

/// A runner marker ready to draw: unit-diamond position, draw scale, color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerView {
    pub position: (f64, f64),
    pub scale: f64,
    pub color: Rgb,
}

/// A base pad ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseView {
    pub occupied: bool,
    pub fill: Rgb,
}

impl Default for BaseView {
    fn default() -> Self {
        BaseView {
            occupied: false,
            fill: Rgb::NEUTRAL_BASE,
        }
    }
}

/// Read-only projection of the controller's state, pushed to the TUI once
/// per tick. The render side must not (and cannot) mutate core state
/// through it.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    /// Last accepted game snapshot, if any.
    pub snapshot: Option<Snapshot>,
    /// Current schedule selection (live/last/next).
    pub selection: Selection,
    pub runners: Vec<RunnerView>,
    pub bases: [BaseView; 3],
    pub seconds_to_next_poll: u64,
    /// True when the last fetch failed and the snapshot shown is old.
    pub stale: bool,
}

/// Commands from the TUI back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Quit,
    /// Force a poll on the next tick instead of waiting out the countdown.
    RefreshNow,
}
