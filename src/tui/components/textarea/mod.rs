//! # TextArea Component
//!
//! The multi-line prompt editor in the bottom region.
//!
//! ## Responsibilities
//!
//! - Capture text input and paste
//! - Handle editing (backspace, delete, cursor and word movement)
//! - Hand the buffer over on submit and clear itself
//!
//! The submit key is a configurable binding owned by the root window, which
//! calls [`TextArea::take`]. Enter inserts a newline.

mod cursor;
mod text_wrap;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::core::layout::{REGION_BOTTOM, RegionSize};
use crate::tui::component::{Component, EventHandler};
use crate::tui::message::Message;

use cursor::CursorState;
use text_wrap::{
    VERTICAL_OVERHEAD, inner_width, next_char_boundary, prev_char_boundary, wrapped_rows,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TextAreaEvent {
    ContentChanged,
}

pub struct TextArea {
    buffer: String,
    cursor: CursorState,
    /// Whether the bottom region has focus (Prop)
    pub focused: bool,
}

impl TextArea {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: CursorState::new(),
            focused: true,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Take the buffer if it holds anything besides whitespace.
    pub fn take(&mut self) -> Option<String> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        self.cursor.reset();
        Some(std::mem::take(&mut self.buffer))
    }

    /// Apply a size addressed to the bottom region.
    pub fn resize(&mut self, size: &RegionSize) {
        if size.id == REGION_BOTTOM {
            self.cursor.last_content_width = size.width;
        }
    }

    fn visible_lines(&self, area_height: u16) -> u16 {
        area_height.saturating_sub(VERTICAL_OVERHEAD).max(1)
    }

    fn visible_text(&self, content_width: u16, visible_lines: u16) -> String {
        let width = inner_width(content_width);
        if width == 0 {
            return String::new();
        }

        wrapped_rows(&self.buffer, width)
            .into_iter()
            .skip(self.cursor.scroll_offset as usize)
            .take(visible_lines as usize)
            .map(|row| &self.buffer[row])
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn insert(&mut self, text: &str) -> Option<TextAreaEvent> {
        self.buffer.insert_str(self.cursor.pos, text);
        self.cursor.pos += text.len();
        Some(TextAreaEvent::ContentChanged)
    }

    fn changed(moved: bool) -> Option<TextAreaEvent> {
        moved.then_some(TextAreaEvent::ContentChanged)
    }
}

impl Default for TextArea {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for TextArea {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let visible_lines = self.visible_lines(area.height);
        self.cursor.last_content_width = area.width;
        self.cursor
            .update_scroll_offset(&self.buffer, area.width, visible_lines);

        let border = if self.focused {
            Color::Green
        } else {
            Color::DarkGray
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border));

        let text = self.visible_text(area.width, visible_lines);
        frame.render_widget(Paragraph::new(text).block(block), area);

        if self.focused {
            frame.set_cursor_position(self.cursor.screen_pos(&self.buffer, area));
        }
    }
}

impl EventHandler for TextArea {
    type Event = TextAreaEvent;

    fn handle_event(&mut self, message: &Message) -> Option<Self::Event> {
        let key = match message {
            Message::Paste(text) => return self.insert(text),
            Message::Key(key) => key,
            _ => return None,
        };

        let word = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Char(c) if !word => self.insert(c.encode_utf8(&mut [0; 4])),
            KeyCode::Enter => self.insert("\n"),
            KeyCode::Backspace if self.cursor.pos > 0 => {
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                Some(TextAreaEvent::ContentChanged)
            }
            KeyCode::Delete if self.cursor.pos < self.buffer.len() => {
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                Some(TextAreaEvent::ContentChanged)
            }
            KeyCode::Left if word => Self::changed(self.cursor.move_word(&self.buffer, -1)),
            KeyCode::Right if word => Self::changed(self.cursor.move_word(&self.buffer, 1)),
            KeyCode::Left if self.cursor.pos > 0 => {
                self.cursor.pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                Some(TextAreaEvent::ContentChanged)
            }
            KeyCode::Right if self.cursor.pos < self.buffer.len() => {
                self.cursor.pos = next_char_boundary(&self.buffer, self.cursor.pos);
                Some(TextAreaEvent::ContentChanged)
            }
            KeyCode::Home => {
                let start = self.cursor.line_start(&self.buffer);
                Self::changed(std::mem::replace(&mut self.cursor.pos, start) != start)
            }
            KeyCode::End => {
                let end = self.cursor.line_end(&self.buffer);
                Self::changed(std::mem::replace(&mut self.cursor.pos, end) != end)
            }
            // Alt+Up/Down page the transcript.
            KeyCode::Up if !word => {
                let width = self.cursor.last_content_width;
                Self::changed(self.cursor.move_vertically(&self.buffer, -1, width))
            }
            KeyCode::Down if !word => {
                let width = self.cursor.last_content_width;
                Self::changed(self.cursor.move_vertically(&self.buffer, 1, width))
            }
            _ => None,
        }
    }
}
