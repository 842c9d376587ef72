pub mod composer;
pub mod dashboard;
pub mod feed;
pub mod profile;

use ratatui::{Frame, layout::Rect};

/// A focusable panel of the main screen.
pub trait PanelWidget {
    fn title(&self) -> &str;
    fn render(&self, frame: &mut Frame, area: Rect, selected: bool);
    fn scroll_up(&mut self);
    fn scroll_down(&mut self);

    /// Enter on the focused panel.
    fn activate(&mut self) {}
}
