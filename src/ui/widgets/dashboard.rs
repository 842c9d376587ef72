use crate::ui::widgets::PanelWidget;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminSection {
    Analytics,
    UserManagement,
    PostManagement,
}

impl AdminSection {
    pub const ALL: [AdminSection; 3] = [
        AdminSection::Analytics,
        AdminSection::UserManagement,
        AdminSection::PostManagement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AdminSection::Analytics => "Analytics",
            AdminSection::UserManagement => "User Management",
            AdminSection::PostManagement => "Post Management",
        }
    }
}

/// Admin navigation entries. None of the sections exist yet; choosing one
/// only records the request.
pub struct DashboardWidget {
    scroll_state: ListState,
    last_visited: Option<AdminSection>,
}

impl DashboardWidget {
    pub fn new() -> Self {
        let mut scroll_state = ListState::default();
        scroll_state.select(Some(0));

        Self {
            scroll_state,
            last_visited: None,
        }
    }

    pub fn selected_section(&self) -> AdminSection {
        let index = self.scroll_state.selected().unwrap_or(0);
        AdminSection::ALL[index.min(AdminSection::ALL.len() - 1)]
    }

    pub fn last_visited(&self) -> Option<AdminSection> {
        self.last_visited
    }
}

impl Default for DashboardWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelWidget for DashboardWidget {
    fn title(&self) -> &str {
        "Dashboard"
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

        let mut items: Vec<ListItem> = AdminSection::ALL
            .iter()
            .map(|section| ListItem::new(format!("> {}", section.label())))
            .collect();

        if let Some(section) = self.last_visited {
            items.push(ListItem::new(""));
            items.push(ListItem::new(Line::from(Span::styled(
                format!("Navigating to {}", section.label()),
                Style::default().fg(Color::DarkGray),
            ))));
        }

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        let mut state = self.scroll_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn scroll_up(&mut self) {
        if let Some(selected) = self.scroll_state.selected() {
            if selected > 0 {
                self.scroll_state.select(Some(selected - 1));
            }
        }
    }

    fn scroll_down(&mut self) {
        if let Some(selected) = self.scroll_state.selected() {
            if selected < AdminSection::ALL.len() - 1 {
                self.scroll_state.select(Some(selected + 1));
            }
        }
    }

    fn activate(&mut self) {
        let section = self.selected_section();
        info!(section = section.label(), "navigating to admin section");
        self.last_visited = Some(section);
    }
}
