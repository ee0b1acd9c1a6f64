// Screen layout: fixed header and footer lines, a linescore band, and the
// remaining space split between the diamond and the game info panel.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct AppLayout {
    pub header: Rect,
    pub linescore: Rect,
    pub diamond: Rect,
    pub info: Rect,
    pub footer: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);

    AppLayout {
        header: rows[0],
        linescore: rows[1],
        diamond: middle[0],
        info: middle[1],
        footer: rows[3],
    }
}
