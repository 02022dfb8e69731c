use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::event::TuiEvent;

/// Something that draws itself into a region of the screen: a title bar,
/// a chat bubble, the login card.
///
/// Inputs arrive as struct fields. `render` takes `&mut self` because list
/// views update their scroll offset and height cache while drawing.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// Persistent screen state that turns key presses into screen-level events
/// (a submitted question, a product to open).
pub trait EventHandler {
    type Event;

    /// `None` when the key was consumed without anything for the caller.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
