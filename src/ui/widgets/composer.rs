use crate::composer::{ComposerField, PostComposer};
use crate::ui::center_rect;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

fn field_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused { "_" } else { "" };

    Line::from(vec![
        Span::styled(format!("{:>8}: ", label), label_style),
        Span::raw(value),
        Span::styled(cursor, Style::default().fg(Color::Yellow)),
    ])
}

pub fn render_composer(frame: &mut Frame, area: Rect, composer: &PostComposer) {
    let modal_area = center_rect(70, 60, area);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" New Post ");

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let focus = composer.focus();
    let image_status = match composer.image() {
        Some(_) => Span::styled("  (picked)", Style::default().fg(Color::Green)),
        None => Span::styled("  (none)", Style::default().fg(Color::DarkGray)),
    };

    let mut image_line = field_line("Image", composer.image_input(), focus == ComposerField::Image);
    image_line.spans.push(image_status);

    let mut lines = vec![
        Line::from(""),
        field_line("Title", composer.title(), focus == ComposerField::Title),
        field_line("Content", composer.content(), focus == ComposerField::Content),
        image_line,
        Line::from(""),
    ];

    let tags: Vec<Span> = composer
        .hashtags()
        .iter()
        .map(|tag| Span::styled(format!("{} ", tag), Style::default().fg(Color::Blue)))
        .collect();
    if !tags.is_empty() {
        lines.push(Line::from(tags));
        lines.push(Line::from(""));
    }

    if composer.is_loading() {
        lines.push(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Blue),
        )));
    } else if let Some(status) = composer.status() {
        lines.push(Line::from(Span::styled(
            status,
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab next field | Enter on Image to pick | Ctrl-S post | Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}
