use crate::composer::{ComposerField, PostComposer};
use crate::config::Config;
use crate::error::FetchError;
use crate::feeds::PageRequest;
use crate::gateway::{Gateway, PostRecord, Session};
use crate::ui;
use crate::ui::widgets::dashboard::DashboardWidget;
use crate::ui::widgets::feed::FeedView;
use crate::ui::widgets::profile::ProfileWidget;
use crate::ui::widgets::PanelWidget;
use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Feed,
    Profile,
    Dashboard,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Feed => Focus::Profile,
            Focus::Profile => Focus::Dashboard,
            Focus::Dashboard => Focus::Feed,
        }
    }
}

/// Results of gateway calls made off the UI loop.
#[derive(Debug)]
pub enum AppMessage {
    Page {
        request: PageRequest,
        result: Result<Vec<PostRecord>, FetchError>,
    },
    Submitted(Result<(), FetchError>),
    Session(Result<Option<Session>, FetchError>),
}

pub struct App {
    gateway: Arc<dyn Gateway>,
    feed: FeedView,
    profile: ProfileWidget,
    dashboard: DashboardWidget,
    composer: Option<PostComposer>,
    focus: Focus,
    status: Option<String>,
    tick_rate: Duration,
    should_quit: bool,
    tx: mpsc::UnboundedSender<AppMessage>,
    rx: mpsc::UnboundedReceiver<AppMessage>,
}

impl App {
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            gateway,
            feed: FeedView::new(&config.feed, config.profile.username.clone()),
            profile: ProfileWidget::new(config.profile.clone()),
            dashboard: DashboardWidget::new(),
            composer: None,
            focus: Focus::Feed,
            status: None,
            tick_rate: Duration::from_millis(config.general.tick_rate_ms),
            should_quit: false,
            tx,
            rx,
        }
    }

    pub fn feed(&self) -> &FeedView {
        &self.feed
    }

    pub fn profile(&self) -> &ProfileWidget {
        &self.profile
    }

    pub fn dashboard(&self) -> &DashboardWidget {
        &self.dashboard
    }

    pub fn composer(&self) -> Option<&PostComposer> {
        self.composer.as_ref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn focused_mut(&mut self) -> &mut dyn PanelWidget {
        match self.focus {
            Focus::Feed => &mut self.feed,
            Focus::Profile => &mut self.profile,
            Focus::Dashboard => &mut self.dashboard,
        }
    }

    /// Start fetching the next feed page unless one is already running or
    /// the feed is exhausted.
    pub fn request_next_page(&mut self) {
        let Some(request) = self.feed.begin_fetch() else {
            return;
        };

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway.fetch_posts(request.range()).await;
            let _ = tx.send(AppMessage::Page { request, result });
        });
    }

    pub fn check_session(&mut self) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway.current_session().await;
            let _ = tx.send(AppMessage::Session(result));
        });
    }

    fn submit_composer(&mut self) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };
        if composer.is_loading() {
            return;
        }
        let Ok(record) = composer.begin_submit(Utc::now()) else {
            return;
        };

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = gateway.upsert_post(record).await;
            let _ = tx.send(AppMessage::Submitted(result));
        });
    }

    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::Page { request, result } => match self.feed.apply_page(request, result) {
                Some(Ok(_)) => self.status = None,
                Some(Err(err)) => self.status = Some(format!("Error fetching posts: {}", err)),
                None => {}
            },
            AppMessage::Submitted(result) => {
                let Some(composer) = self.composer.as_mut() else {
                    return;
                };
                if composer.finish_submit(result).is_ok() {
                    self.status = composer.status().map(str::to_string);
                    self.composer = None;
                }
            }
            AppMessage::Session(Ok(Some(session))) => {
                info!(user = %session.user_id, "session found");
                self.profile.set_session(Some(session));
            }
            AppMessage::Session(Ok(None)) => {
                info!("no user");
                self.profile.set_session(None);
            }
            AppMessage::Session(Err(err)) => {
                warn!(error = %err, "session check failed");
                self.profile.set_session(None);
            }
        }
    }

    /// Apply every message that has already arrived.
    pub fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.composer.is_some() {
            self.handle_composer_key(key);
        } else if self.feed.is_commenting() {
            self.handle_comment_key(key);
        } else {
            self.handle_normal_key(key);
        }
    }

    fn handle_composer_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.submit_composer();
            return;
        }

        let Some(composer) = self.composer.as_mut() else {
            return;
        };
        if composer.is_loading() {
            return;
        }

        match key.code {
            KeyCode::Esc => self.composer = None,
            KeyCode::Tab => composer.focus_next(),
            KeyCode::Enter if composer.focus() == ComposerField::Image => {
                if let Err(err) = composer.pick_typed_image() {
                    warn!(error = %err, "image not accessible");
                }
            }
            KeyCode::Enter => composer.focus_next(),
            KeyCode::Backspace => composer.delete_char(),
            KeyCode::Char(c) => composer.insert_char(c),
            _ => {}
        }
    }

    fn handle_comment_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.feed.cancel_comment(),
            KeyCode::Enter => {
                self.feed.submit_comment();
            }
            KeyCode::Backspace => {
                if let Some(card) = self.feed.selected_card_mut() {
                    card.pop_input();
                }
            }
            KeyCode::Char(c) => {
                if let Some(card) = self.feed.selected_card_mut() {
                    card.push_input(c);
                }
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Char('n') => {
                self.status = None;
                self.composer = Some(PostComposer::new());
            }
            KeyCode::Up | KeyCode::Char('k') => self.focused_mut().scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => {
                self.focused_mut().scroll_down();
                if self.focus == Focus::Feed && self.feed.wants_more() {
                    self.request_next_page();
                }
            }
            KeyCode::Enter => self.focused_mut().activate(),
            _ if self.focus != Focus::Feed => {}
            KeyCode::Home | KeyCode::Char('g') => self.feed.scroll_to_top(),
            KeyCode::Char('c') => self.feed.start_comment(),
            KeyCode::Char('x') => {
                self.feed.delete_last_comment();
            }
            KeyCode::Char('t') => {
                if let Some(tag) = self.feed.next_hashtag() {
                    self.status = Some(format!("Hashtag pressed: {}", tag));
                }
            }
            KeyCode::Char('o') => self.open_selected_image(),
            KeyCode::Char('r') => {
                self.feed.reset();
                self.request_next_page();
            }
            _ => {}
        }
    }

    fn open_selected_image(&mut self) {
        let Some(image) = self
            .feed
            .selected_card()
            .and_then(|card| card.post().image_url.clone())
        else {
            return;
        };

        if let Err(e) = open::that_detached(&image) {
            warn!(image = %image, error = %e, "error loading image");
            self.status = Some(format!("Could not open image: {}", e));
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.check_session();
        self.request_next_page();

        while !self.should_quit {
            self.process_messages();
            terminal.draw(|frame| ui::draw(frame, self))?;

            if event::poll(self.tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        info!("exiting");
        Ok(())
    }
}
