use ratatui::Frame;
use ratatui::layout::Rect;

use super::command::Command;
use super::message::Message;

/// A reusable UI component.
///
/// Components hold their own presentation state and render to a `Frame`
/// within a given `Rect`. `render` takes `&mut self` so components can keep
/// layout caches (wrapped lines, scroll offsets) up to date during the pass.
pub trait Component {
    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that reacts to bus messages.
pub trait Update {
    /// Handle one message. Returned commands run after the dispatch pass.
    fn update(&mut self, message: &Message) -> Option<Command>;
}

/// A component that turns key input into a higher-level event for its owner.
pub trait EventHandler {
    /// The type of high-level event this component emits.
    type Event;

    fn handle_event(&mut self, message: &Message) -> Option<Self::Event>;
}
