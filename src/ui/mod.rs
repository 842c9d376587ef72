pub mod widgets;

use crate::app::{App, Focus};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use self::widgets::composer::render_composer;
use self::widgets::PanelWidget;

pub fn draw(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[0]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(columns[1]);

    app.feed()
        .render(frame, columns[0], app.focus() == Focus::Feed);
    app.profile()
        .render(frame, sidebar[0], app.focus() == Focus::Profile);
    app.dashboard()
        .render(frame, sidebar[1], app.focus() == Focus::Dashboard);

    render_status_bar(frame, rows[1], app);

    if let Some(composer) = app.composer() {
        render_composer(frame, rows[0], composer);
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let help = if app.composer().is_some() {
        "composing"
    } else if app.feed().is_commenting() {
        "Enter comment | Esc cancel"
    } else {
        "q quit | Tab panel | j/k move | g top | n post | c comment | x delete | t tag | o image | r reload"
    };

    let mut spans = vec![Span::styled(help, Style::default().fg(Color::DarkGray))];
    if let Some(status) = app.status() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status, Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// A rectangle `percent_x` by `percent_y` of `r`, centred in it.
pub fn center_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
