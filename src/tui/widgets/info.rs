// Game info panel: inning, balls/strikes/outs, and the current matchup.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::protocol::ViewSnapshot;
use crate::reconcile::{clamp_balls, clamp_strikes};

pub fn render(frame: &mut Frame, area: Rect, view: &ViewSnapshot) {
    let mut lines: Vec<Line> = Vec::new();

    match &view.snapshot {
        Some(snap) => {
            lines.push(Line::from(Span::styled(
                format!("{} {}", snap.half.label(), snap.inning),
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(format!(
                "B: {}  S: {}  O: {}",
                count_dots(clamp_balls(snap.balls), 3),
                count_dots(clamp_strikes(snap.strikes), 2),
                count_dots(snap.outs.min(3), 3),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "Batter:  {}",
                snap.batter.as_deref().unwrap_or("-")
            )));
            lines.push(Line::from(format!(
                "Pitcher: {}",
                snap.pitcher.as_deref().unwrap_or("-")
            )));
            if !snap.status.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(snap.status.clone()));
            }
        }
        None => {
            lines.push(Line::from("B: -  S: -  O: -"));
            lines.push(Line::from("Batter:  -"));
            lines.push(Line::from("Pitcher: -"));
        }
    }

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Game"));
    frame.render_widget(paragraph, area);
}

/// "●●○" style count markers: `value` filled out of `max`.
fn count_dots(value: u8, max: u8) -> String {
    let mut s = String::new();
    for i in 0..max {
        s.push(if i < value { '●' } else { '○' });
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_dots_fill_left_to_right() {
        assert_eq!(count_dots(0, 3), "○○○");
        assert_eq!(count_dots(2, 3), "●●○");
        assert_eq!(count_dots(2, 2), "●●");
    }
}
