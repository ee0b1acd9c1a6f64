// The diamond: base pads with their fade-driven fill colors and runner
// markers at their interpolated positions.

use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::model::{Base, Destination};
use crate::protocol::ViewSnapshot;
use crate::tui::to_color;

/// Flip model coordinates (y grows downward, home at the bottom) into
/// canvas coordinates (y grows upward).
fn canvas_xy(position: (f64, f64)) -> (f64, f64) {
    (position.0, 1.0 - position.1)
}

pub fn render(frame: &mut Frame, area: Rect, view: &ViewSnapshot) {
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Diamond"))
        .x_bounds([-0.2, 1.2])
        .y_bounds([-0.2, 1.2])
        .paint(|ctx| paint_diamond(ctx, view));
    frame.render_widget(canvas, area);
}

fn paint_diamond(ctx: &mut Context<'_>, view: &ViewSnapshot) {
    let home = canvas_xy(Destination::Home.diamond_position());
    let corners = [
        canvas_xy(Base::First.diamond_position()),
        canvas_xy(Base::Second.diamond_position()),
        canvas_xy(Base::Third.diamond_position()),
        home,
    ];

    // Base paths.
    let mut previous = home;
    for corner in corners {
        ctx.draw(&CanvasLine {
            x1: previous.0,
            y1: previous.1,
            x2: corner.0,
            y2: corner.1,
            color: Color::DarkGray,
        });
        previous = corner;
    }

    // Base pads, colored by the fade state.
    for base in Base::ALL {
        let (x, y) = canvas_xy(base.diamond_position());
        let fill = to_color(view.bases[base.index()].fill);
        ctx.draw(&Points {
            coords: &pad_coords(x, y),
            color: fill,
        });
    }

    // Runners, drawn last so they sit on top of the pads. A shrinking
    // (scoring-out) runner covers fewer points.
    for runner in &view.runners {
        let (x, y) = canvas_xy(runner.position);
        let coords = pad_coords(x, y);
        let keep = ((coords.len() as f64) * runner.scale).ceil() as usize;
        if keep == 0 {
            continue;
        }
        ctx.draw(&Points {
            coords: &coords[..keep.min(coords.len())],
            color: to_color(runner.color),
        });
    }
}

/// A small cluster of points around a center, standing in for a filled
/// marker at canvas resolution.
fn pad_coords(x: f64, y: f64) -> Vec<(f64, f64)> {
    const R: f64 = 0.05;
    vec![
        (x, y),
        (x - R, y),
        (x + R, y),
        (x, y - R),
        (x, y + R),
        (x - R / 2.0, y - R / 2.0),
        (x + R / 2.0, y - R / 2.0),
        (x - R / 2.0, y + R / 2.0),
        (x + R / 2.0, y + R / 2.0),
    ]
}
