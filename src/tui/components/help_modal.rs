//! # Help Modal
//!
//! Overlay listing the active key bindings and the slash commands. Closed by
//! Esc, Enter or the modal key itself (handled by the root window).

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::message::Message;

use super::overlay::{OVERLAY_BG, OVERLAY_BORDER, OVERLAY_FG, OVERLAY_HINT, centered_fixed};

const MODAL_WIDTH: u16 = 50;

pub struct HelpModal {
    bindings: Vec<(&'static str, String)>,
    commands: Vec<(&'static str, &'static str)>,
}

impl HelpModal {
    pub fn new(
        bindings: Vec<(&'static str, String)>,
        commands: Vec<(&'static str, &'static str)>,
    ) -> Self {
        Self { bindings, commands }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let heading = Style::default().add_modifier(Modifier::BOLD);
        let hint = Style::default().fg(OVERLAY_HINT);

        let mut lines = vec![Line::styled("Keys", heading)];
        for (action, keys) in &self.bindings {
            lines.push(Line::from(vec![
                Span::raw(format!("  {action:<14}")),
                Span::styled(keys.clone(), hint),
            ]));
        }
        lines.push(Line::default());
        lines.push(Line::styled("Commands", heading));
        for (usage, summary) in &self.commands {
            lines.push(Line::from(vec![
                Span::raw(format!("  {usage:<20}")),
                Span::styled(*summary, hint),
            ]));
        }
        lines
    }
}

impl EventHandler for HelpModal {
    /// Emitted when the modal should close.
    type Event = ();

    fn handle_event(&mut self, message: &Message) -> Option<Self::Event> {
        match message {
            Message::Key(key) if matches!(key.code, KeyCode::Esc | KeyCode::Enter) => Some(()),
            _ => None,
        }
    }
}

impl Component for HelpModal {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let lines = self.lines();
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(4);
        let overlay = centered_fixed(MODAL_WIDTH + 2, height, area);
        if overlay.width == 0 || overlay.height == 0 {
            return;
        }
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(OVERLAY_BORDER))
            .style(Style::default().bg(OVERLAY_BG).fg(OVERLAY_FG))
            .title(" Help ")
            .padding(Padding::new(2, 2, 1, 1));
        frame.render_widget(Paragraph::new(lines).block(block), overlay);
    }
}
