// Inning-by-inning linescore with R/H/E totals, one row per team, styled
// with the team's colors.

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::colors::ColorTable;
use crate::model::TeamLine;
use crate::protocol::ViewSnapshot;
use crate::tui::to_color;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    view: &ViewSnapshot,
    colors: &ColorTable,
    max_innings: usize,
) {
    let Some(snapshot) = &view.snapshot else {
        let placeholder = match (&view.selection.next, view.selection.is_idle()) {
            (_, true) => "No game data",
            (Some(_), _) => "No live game, waiting for first pitch",
            (None, _) => "No live game",
        };
        frame.render_widget(Paragraph::new(placeholder), area);
        return;
    };

    let innings = snapshot
        .away
        .innings
        .len()
        .max(snapshot.home.innings.len())
        .max(max_innings);
    let name_width = snapshot
        .away
        .name
        .len()
        .max(snapshot.home.name.len())
        .max("TEAM".len());

    let mut lines = vec![header_line(innings, name_width)];
    lines.push(team_line(&snapshot.away, innings, name_width, colors));
    lines.push(team_line(&snapshot.home, innings, name_width, colors));

    frame.render_widget(Paragraph::new(lines), area);
}

fn header_line(innings: usize, name_width: usize) -> Line<'static> {
    let mut text = format!(" {:<name_width$}", "TEAM");
    for i in 1..=innings {
        text.push_str(&format!(" {i:>2}"));
    }
    text.push_str(&format!(" {:>3} {:>3} {:>3}", "R", "H", "E"));
    Line::from(Span::styled(
        text,
        Style::default().fg(ratatui::style::Color::Yellow),
    ))
}

fn team_line(
    team: &TeamLine,
    innings: usize,
    name_width: usize,
    colors: &ColorTable,
) -> Line<'static> {
    let team_colors = colors.get(&team.name);
    let mut text = format!(" {:<name_width$}", team.name);
    for i in 0..innings {
        match team.innings.get(i).copied().flatten() {
            Some(runs) => text.push_str(&format!(" {runs:>2}")),
            None => text.push_str(&format!(" {:>2}", "-")),
        }
    }
    text.push_str(&format!(
        " {:>3} {:>3} {:>3}",
        team.totals.runs, team.totals.hits, team.totals.errors
    ));

    Line::from(Span::styled(
        text,
        Style::default()
            .fg(to_color(team_colors.text))
            .bg(to_color(team_colors.fill)),
    ))
}
