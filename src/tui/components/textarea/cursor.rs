//! Cursor and scroll state for the text area. The buffer belongs to
//! `TextArea`; methods here borrow it.

use std::ops::Range;

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthStr;

use super::text_wrap::{
    BORDER_OFFSET, inner_width, next_word_boundary, prev_word_boundary, wrapped_rows,
};

pub(super) struct CursorState {
    /// Byte offset into the buffer, always on a char boundary.
    pub pos: usize,
    /// First wrapped row shown.
    pub scroll_offset: u16,
    /// Width of the last bottom-region size or render, for Up/Down.
    pub last_content_width: u16,
}

/// Index of the row holding `pos`: the last one starting at or before it.
fn row_of(rows: &[Range<usize>], pos: usize) -> usize {
    rows.partition_point(|row| row.start <= pos).saturating_sub(1)
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_offset: 0,
            last_content_width: 80,
        }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll_offset = 0;
    }

    pub fn line_start(&self, buffer: &str) -> usize {
        buffer[..self.pos].rfind('\n').map_or(0, |i| i + 1)
    }

    pub fn line_end(&self, buffer: &str) -> usize {
        buffer[self.pos..]
            .find('\n')
            .map_or(buffer.len(), |i| self.pos + i)
    }

    /// Jump one word back (`direction < 0`) or forward. `true` if it moved.
    pub fn move_word(&mut self, buffer: &str, direction: i16) -> bool {
        let target = if direction < 0 {
            prev_word_boundary(buffer, self.pos)
        } else {
            next_word_boundary(buffer, self.pos)
        };
        std::mem::replace(&mut self.pos, target) != target
    }

    /// Move to the neighbouring wrapped row, keeping the char column where
    /// the target row is long enough. `false` at the first or last row.
    pub fn move_vertically(&mut self, buffer: &str, direction: i16, content_width: u16) -> bool {
        let width = inner_width(content_width);
        if width == 0 {
            return false;
        }

        let rows = wrapped_rows(buffer, width);
        let current = row_of(&rows, self.pos);
        let target = if direction < 0 {
            match current.checked_sub(1) {
                Some(row) => row,
                None => return false,
            }
        } else if current + 1 < rows.len() {
            current + 1
        } else {
            return false;
        };

        let from = &rows[current];
        let column = buffer[from.start..self.pos.max(from.start)].chars().count();
        let to = rows[target].clone();
        self.pos = buffer[to.clone()]
            .char_indices()
            .nth(column)
            .map_or(to.end, |(i, _)| to.start + i);
        true
    }

    /// Scroll just enough to keep the cursor row among `visible_lines` rows.
    pub fn update_scroll_offset(&mut self, buffer: &str, content_width: u16, visible_lines: u16) {
        let visible_lines = visible_lines.max(1);
        let width = inner_width(content_width);
        if width == 0 {
            self.scroll_offset = 0;
            return;
        }

        let rows = wrapped_rows(buffer, width);
        if rows.len() <= visible_lines as usize {
            self.scroll_offset = 0;
            return;
        }

        let cursor_row = row_of(&rows, self.pos) as u16;
        if cursor_row < self.scroll_offset {
            self.scroll_offset = cursor_row;
        } else if cursor_row >= self.scroll_offset + visible_lines {
            self.scroll_offset = cursor_row + 1 - visible_lines;
        }
    }

    /// Terminal cell of the cursor inside the bordered `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let origin = (area.x + BORDER_OFFSET, area.y + BORDER_OFFSET);
        let width = inner_width(area.width);
        if width == 0 {
            return origin;
        }

        let rows = wrapped_rows(buffer, width);
        let row = row_of(&rows, self.pos);
        let start = rows[row].start.min(self.pos);
        let column = (buffer[start..self.pos].width() as u16).min(width);
        let line = (row as u16).saturating_sub(self.scroll_offset);

        (origin.0 + column, origin.1 + line)
    }
}
