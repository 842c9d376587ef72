use crate::config::ProfileConfig;
use crate::gateway::Session;
use crate::ui::widgets::PanelWidget;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct ProfileWidget {
    config: ProfileConfig,
    session: Option<Session>,
}

impl ProfileWidget {
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl PanelWidget for ProfileWidget {
    fn title(&self) -> &str {
        "Profile"
    }

    fn render(&self, frame: &mut Frame, area: Rect, selected: bool) {
        let border_style = if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };

        let block = Block::default()
            .title(format!(" {} ", self.title()))
            .borders(Borders::ALL)
            .border_style(border_style);

        let signed_in = match &self.session {
            Some(session) => Span::styled(
                format!(
                    "signed in as {}",
                    session.email.as_deref().unwrap_or(&session.user_id)
                ),
                Style::default().fg(Color::Green),
            ),
            None => Span::styled("not signed in", Style::default().fg(Color::DarkGray)),
        };

        let mut lines = vec![
            Line::from(Span::styled(
                self.config.username.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(self.config.bio.clone()),
        ];
        if let Some(avatar) = &self.config.avatar_url {
            lines.push(Line::from(Span::styled(
                avatar.clone(),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(signed_in));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn scroll_up(&mut self) {}

    fn scroll_down(&mut self) {}
}
