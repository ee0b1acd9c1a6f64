// Countdown footer: seconds to the next poll, the next scheduled game,
// and the key hints. Redrawn every tick.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::ViewSnapshot;

pub fn render(frame: &mut Frame, area: Rect, view: &ViewSnapshot) {
    let mut text = format!(" Next update in: {}s", view.seconds_to_next_poll);

    if let Some(next) = &view.selection.next {
        text.push_str(&format!(
            " | Next: {} @ {} {}",
            next.away,
            next.home,
            next.start_time.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    text.push_str(" | q:Quit r:Refresh");

    let paragraph = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::DIM),
    )));
    frame.render_widget(paragraph, area);
}
