//! # Viewport Component
//!
//! The transcript: an append-only list of styled entries, word-wrapped to the
//! width of the `top-inner` region and shown in a scroll view.
//!
//! ## Wrapping
//!
//! Entries keep their source text. The wrapped lines are a cache that is
//! rebuilt whenever the wrap width changes, so a resize never leaves lines
//! wrapped for the old width. `add` wraps only the new entry.
//!
//! ## Keys
//!
//! Paging (PgUp/PgDn, Alt+Up/Alt+Down) works regardless of focus. Line
//! scrolling and jump-to-end need focus.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::layout::{REGION_TOP_INNER, RegionSize};
use crate::tui::component::{Component, EventHandler};
use crate::tui::message::{EntryKind, Message, TranscriptEntry};

/// Columns kept free to the right of wrapped text.
pub const WRAP_MARGIN: u16 = 5;

const PROMPT_COLOR: Color = Color::Rgb(0xa5, 0x86, 0xd9);
const RESPONSE_COLOR: Color = Color::Rgb(0xe9, 0xf5, 0xea);
const TOOL_COLOR: Color = Color::Rgb(0x3c, 0x5a, 0x42);
const ERROR_COLOR: Color = Color::Rgb(0xdd, 0x9f, 0x6b);

pub fn entry_style(kind: EntryKind) -> Style {
    match kind {
        EntryKind::Prompt => Style::default().fg(PROMPT_COLOR),
        EntryKind::Response => Style::default().fg(RESPONSE_COLOR),
        EntryKind::ToolLog => Style::default().fg(TOOL_COLOR).add_modifier(Modifier::DIM),
        EntryKind::ToolResponse => Style::default().fg(TOOL_COLOR),
        EntryKind::Error => Style::default().fg(ERROR_COLOR).add_modifier(Modifier::DIM),
        EntryKind::SlashResult => Style::default(),
    }
}

pub struct Viewport {
    entries: Vec<TranscriptEntry>,
    lines: Vec<Line<'static>>,
    width: u16,
    height: u16,
    scroll_state: ScrollViewState,
    stick_to_bottom: bool,
    /// Whether the top region has focus
    pub focused: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            lines: Vec::new(),
            width: 0,
            height: 0,
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            focused: false,
        }
    }

    pub fn wrap_width(&self) -> u16 {
        self.width.saturating_sub(WRAP_MARGIN)
    }

    /// Append an entry and scroll to the bottom.
    pub fn add(&mut self, entry: TranscriptEntry) {
        let lines = wrap_entry(&entry, self.wrap_width());
        self.lines.extend(lines);
        self.entries.push(entry);
        self.stick_to_bottom = true;
    }

    /// Replace everything with `entries`, in order.
    pub fn reset(&mut self, entries: Vec<TranscriptEntry>) {
        self.entries = entries;
        self.rewrap();
        self.scroll_state = ScrollViewState::default();
        self.stick_to_bottom = true;
    }

    /// Apply a size addressed to `top-inner`.
    pub fn resize(&mut self, size: &RegionSize) {
        if size.id != REGION_TOP_INNER {
            return;
        }
        let old_wrap = self.wrap_width();
        self.width = size.width;
        self.height = size.height;
        if self.wrap_width() != old_wrap {
            self.rewrap();
        }
    }

    fn rewrap(&mut self) {
        let width = self.wrap_width();
        self.lines = self
            .entries
            .iter()
            .flat_map(|entry| wrap_entry(entry, width))
            .collect();
    }

    /// Wrapped lines as plain text.
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    fn content_height(&self) -> u16 {
        u16::try_from(self.lines.len()).unwrap_or(u16::MAX)
    }

    fn repin_if_at_bottom(&mut self) {
        let max_y = self.content_height().saturating_sub(self.height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }
}

fn wrap_entry(entry: &TranscriptEntry, width: u16) -> Vec<Line<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let options = textwrap::Options::new(width as usize)
        .break_words(true)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
    let style = entry_style(entry.kind);
    textwrap::wrap(&entry.text, options)
        .into_iter()
        .map(|line| Line::styled(line.into_owned(), style))
        .collect()
}

impl Component for Viewport {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let content_height = self.content_height();
        let mut scroll_view = ScrollView::new(Size::new(area.width, content_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let text = Text::from(self.lines.clone());
        scroll_view.render_widget(
            Paragraph::new(text),
            Rect::new(0, 0, self.wrap_width().min(area.width), content_height),
        );

        if self.stick_to_bottom {
            self.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.scroll_state);
    }
}

impl EventHandler for Viewport {
    type Event = ();

    fn handle_event(&mut self, message: &Message) -> Option<Self::Event> {
        let Message::Key(key) = message else {
            return None;
        };
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::PageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            KeyCode::Up if alt => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            KeyCode::PageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            KeyCode::Down if alt => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            KeyCode::End => {
                self.stick_to_bottom = true;
                self.scroll_state.scroll_to_bottom();
            }
            KeyCode::Up if self.focused => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            KeyCode::Down if self.focused => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            _ => return None,
        }
        Some(())
    }
}
