// TUI: applies view snapshots from the controller and renders at ~30 fps.
//
// The TUI owns a `ViewState` holding the latest projection pushed by the
// controller. It never mutates core state; the only traffic back is
// `UserCommand` (quit, manual refresh).

pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyModifiers};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::colors::{ColorTable, Rgb};
use crate::protocol::{UserCommand, ViewSnapshot};

use layout::build_layout;

/// Convert a core color into a terminal color.
pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state: the latest controller projection plus render settings.
pub struct ViewState {
    pub view: ViewSnapshot,
    pub colors: ColorTable,
    pub max_innings: usize,
}

impl ViewState {
    pub fn new(colors: ColorTable, max_innings: usize) -> Self {
        ViewState {
            view: ViewSnapshot::default(),
            colors,
            max_innings,
        }
    }

    /// Replace the displayed projection. Snapshots arrive whole, so there
    /// is nothing incremental to merge.
    pub fn apply(&mut self, view: ViewSnapshot) {
        self.view = view;
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    render_header(frame, layout.header, &state.view);
    widgets::linescore::render(
        frame,
        layout.linescore,
        &state.view,
        &state.colors,
        state.max_innings,
    );
    widgets::diamond::render(frame, layout.diamond, &state.view);
    widgets::info::render(frame, layout.info, &state.view);
    widgets::footer::render(frame, layout.footer, &state.view);
}

fn render_header(frame: &mut Frame, area: ratatui::layout::Rect, view: &ViewSnapshot) {
    let mode = if view.selection.live.is_some() {
        "LIVE"
    } else if view.selection.next.is_some() {
        "SCHEDULED"
    } else if view.selection.last.is_some() {
        "FINAL"
    } else {
        "NO GAMES"
    };

    let mut spans = vec![Span::styled(
        format!(" SCORECAST | {mode}"),
        Style::default().fg(Color::White),
    )];
    if view.stale {
        spans.push(Span::styled(
            "  [STALE]",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the user quits or the controller goes away.
pub async fn run(
    mut ui_rx: mpsc::Receiver<ViewSnapshot>,
    cmd_tx: mpsc::Sender<UserCommand>,
    colors: ColorTable,
    max_innings: usize,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Restore the terminal even if rendering panics.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut state = ViewState::new(colors, max_innings);
    let mut event_stream = EventStream::new();
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(view) => state.apply(view),
                    // Controller shut down.
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        let quit = key.code == KeyCode::Char('q')
                            || (key.code == KeyCode::Char('c')
                                && key.modifiers.contains(KeyModifiers::CONTROL));
                        if quit {
                            let _ = cmd_tx.send(UserCommand::Quit).await;
                            break;
                        }
                        if key.code == KeyCode::Char('r') {
                            let _ = cmd_tx.send(UserCommand::RefreshNow).await;
                        }
                    }
                    Some(Ok(_)) => {
                        // Resize and mouse events need no handling; the next
                        // render picks up the new size.
                    }
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
