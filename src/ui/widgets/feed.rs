use crate::card::CardPresenter;
use crate::config::FeedConfig;
use crate::error::FetchError;
use crate::feeds::{FeedLoader, PageRequest, PostPage};
use crate::gateway::PostRecord;
use crate::ui::widgets::PanelWidget;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use tracing::info;

/// The scrolling list of post cards.
pub struct FeedView {
    title: String,
    loader: FeedLoader,
    cards: Vec<CardPresenter>,
    comment_author: String,
    scroll_state: ListState,
    threshold: f64,
    commenting: bool,
}

/// Whether `selected` sits within the last `threshold` fraction of a list of
/// `len` items. The final item always counts, and an empty list is its own end.
pub fn is_near_end(selected: Option<usize>, len: usize, threshold: f64) -> bool {
    if len == 0 {
        return true;
    }
    let Some(index) = selected else {
        return false;
    };
    let remaining = len.saturating_sub(index + 1) as f64;
    remaining < (len as f64 * threshold).max(1.0)
}

impl FeedView {
    pub fn new(config: &FeedConfig, comment_author: impl Into<String>) -> Self {
        Self {
            title: config.title.clone(),
            loader: FeedLoader::new(config.page_size),
            cards: Vec::new(),
            comment_author: comment_author.into(),
            scroll_state: ListState::default(),
            threshold: config.load_more_threshold,
            commenting: false,
        }
    }

    pub fn loader(&self) -> &FeedLoader {
        &self.loader
    }

    pub fn cards(&self) -> &[CardPresenter] {
        &self.cards
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.scroll_state.selected()
    }

    pub fn selected_card(&self) -> Option<&CardPresenter> {
        self.selected_index().and_then(|i| self.cards.get(i))
    }

    pub fn selected_card_mut(&mut self) -> Option<&mut CardPresenter> {
        let index = self.selected_index()?;
        self.cards.get_mut(index)
    }

    pub fn begin_fetch(&mut self) -> Option<PageRequest> {
        self.loader.begin()
    }

    /// Feed a finished fetch through the loader and add cards for whatever
    /// it merged. Cards are prepended in the same order as the posts.
    pub fn apply_page(
        &mut self,
        request: PageRequest,
        result: Result<Vec<PostRecord>, FetchError>,
    ) -> Option<Result<PostPage, FetchError>> {
        let outcome = self.loader.complete(request, result)?;

        if let Ok(page) = &outcome {
            let mut fresh: Vec<CardPresenter> = page
                .posts
                .iter()
                .cloned()
                .map(|post| CardPresenter::new(post, self.comment_author.clone()))
                .collect();
            let added = fresh.len();
            fresh.append(&mut self.cards);
            self.cards = fresh;

            // Keep the selection on the same post now that it has moved down.
            match self.scroll_state.selected() {
                Some(index) => self.scroll_state.select(Some(index + added)),
                None if !self.cards.is_empty() => self.scroll_state.select(Some(0)),
                None => {}
            }
        }

        Some(outcome)
    }

    /// True when the selection is near the end and another page may exist.
    pub fn wants_more(&self) -> bool {
        self.loader.has_more()
            && !self.loader.is_fetching()
            && is_near_end(self.selected_index(), self.cards.len(), self.threshold)
    }

    pub fn scroll_to_top(&mut self) {
        if !self.cards.is_empty() {
            self.scroll_state.select(Some(0));
        }
    }

    /// Throw away every card, comments included, and start from page one.
    pub fn reset(&mut self) {
        self.loader.reset();
        self.cards.clear();
        self.scroll_state.select(None);
        self.commenting = false;
    }

    pub fn is_commenting(&self) -> bool {
        self.commenting
    }

    pub fn start_comment(&mut self) {
        if self.selected_card().is_some() {
            self.commenting = true;
        }
    }

    pub fn cancel_comment(&mut self) {
        self.commenting = false;
        if let Some(card) = self.selected_card_mut() {
            card.clear_input();
        }
    }

    pub fn submit_comment(&mut self) -> Option<u64> {
        let id = self.selected_card_mut()?.submit_input();
        if id.is_some() {
            self.commenting = false;
        }
        id
    }

    /// Delete the newest comment on the selected card.
    pub fn delete_last_comment(&mut self) -> Option<u64> {
        let card = self.selected_card_mut()?;
        let id = card.comments().last()?.id;
        card.delete_comment(id);
        Some(id)
    }

    pub fn next_hashtag(&mut self) -> Option<String> {
        let tag = self.selected_card_mut()?.next_hashtag()?.to_string();
        info!(tag = %tag, "hashtag pressed");
        Some(tag)
    }

    fn card_lines(&self, card: &CardPresenter, width: usize, selected: bool) -> Vec<Line<'static>> {
        let post = card.post();
        let mut lines = Vec::new();

        lines.push(Line::from(vec![
            Span::styled(
                post.author.clone().unwrap_or_else(|| "anonymous".to_string()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", post.created_at.format("%Y-%m-%d %H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(Span::styled(
            post.title.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )));

        for wrapped in textwrap::wrap(&post.content, width.max(10)) {
            lines.push(Line::from(wrapped.into_owned()));
        }

        if let Some(image) = &post.image_url {
            lines.push(Line::from(Span::styled(
                format!("[image] {}", image),
                Style::default().fg(Color::Cyan),
            )));
        }

        if !post.hashtags.is_empty() {
            let spans: Vec<Span<'static>> = post
                .hashtags
                .iter()
                .enumerate()
                .map(|(i, tag)| {
                    let mut style = Style::default().fg(Color::Blue);
                    if card.highlighted_hashtag() == Some(i) {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Span::styled(format!("{} ", tag), style)
                })
                .collect();
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(Span::styled(
            format!("{} comments", card.comments().len()),
            Style::default().fg(Color::Green),
        )));
        for comment in card.comments() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} ", comment.author),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(comment.content.clone()),
            ]));
        }

        if selected && self.commenting {
            lines.push(Line::from(Span::styled(
                format!("> {}_", card.input()),
                Style::default().fg(Color::Yellow),
            )));
        }

        lines.push(Line::from(""));
        lines
    }
}

impl PanelWidget for FeedView {
    fn title(&self) -> &str {
        &self.title
    }

    fn render(&self, frame: &mut Frame, area: Rect, selected: bool) {
        let border_style = if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };

        let block = Block::default()
            .title(format!(" {} ({} posts) ", self.title, self.cards.len()))
            .borders(Borders::ALL)
            .border_style(border_style);

        if self.cards.is_empty() {
            let message = if let Some(error) = self.loader.last_error() {
                format!("Error: {}", error)
            } else if self.loader.is_fetching() {
                "Loading...".to_string()
            } else {
                "No posts yet".to_string()
            };
            frame.render_widget(List::new(vec![ListItem::new(message)]).block(block), area);
            return;
        }

        let width = area.width.saturating_sub(4) as usize;
        let selected_index = self.selected_index();
        let mut items: Vec<ListItem> = self
            .cards
            .iter()
            .enumerate()
            .map(|(i, card)| ListItem::new(self.card_lines(card, width, selected_index == Some(i))))
            .collect();

        if self.loader.is_fetching() && self.loader.has_more() {
            items.push(ListItem::new(Line::from(Span::styled(
                "Loading more posts...",
                Style::default().fg(Color::Blue),
            ))));
        } else if let Some(error) = self.loader.last_error() {
            items.push(ListItem::new(Line::from(Span::styled(
                format!("Error: {}", error),
                Style::default().fg(Color::Red),
            ))));
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray));

        let mut state = self.scroll_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn scroll_up(&mut self) {
        if let Some(selected) = self.scroll_state.selected() {
            if selected > 0 {
                self.commenting = false;
                self.scroll_state.select(Some(selected - 1));
            }
        }
    }

    fn scroll_down(&mut self) {
        if let Some(selected) = self.scroll_state.selected() {
            if selected < self.cards.len().saturating_sub(1) {
                self.commenting = false;
                self.scroll_state.select(Some(selected + 1));
            }
        }
    }
}
