//! # Followup Modal
//!
//! Overlay listing the followup options parsed from the last model response.
//! Up/Down move the highlight (wrapping around), PgUp/PgDn scroll, Enter picks
//! the highlighted key and Esc dismisses with an empty key.
//!
//! The list lives in a fixed-height viewport. Moving the highlight scrolls so
//! the highlighted option and, when there is room, the one after it are fully
//! visible. When only the highlighted option fits it is pinned to the top edge
//! when moving up and to the bottom edge when moving down.

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::core::followup::FollowupOption;
use crate::tui::component::{Component, EventHandler};
use crate::tui::message::Message;

use super::overlay::{OVERLAY_BG, OVERLAY_BORDER, OVERLAY_FG, OVERLAY_HINT, centered_fixed};

/// Width inside the border, padding included.
const MODAL_WIDTH: u16 = 50;
const BODY_HEIGHT: u16 = 20;
/// Option text wraps this narrow to leave room for the marker.
const TEXT_WIDTH: usize = MODAL_WIDTH as usize - 8;

const MARKER: &str = " > ";
const NO_MARKER: &str = "   ";
const CONTINUATION: &str = "     ";

const HEADER: &str = "Follow-up Options";
const FOOTER: &str = "↑/↓: select  PgUp/PgDn: scroll  Enter: submit  Esc: dismiss";
/// Border, padding, header, footer and the blank rows around the body.
const CHROME_ROWS: u16 = 2 + 2 + 1 + 1 + 1 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone)]
struct BodyLine {
    option: Option<usize>,
    first: bool,
    text: String,
}

#[derive(Debug)]
pub struct FollowupModal {
    options: Vec<FollowupOption>,
    selected: usize,
    lines: Vec<BodyLine>,
    /// First and last body line of each option.
    ranges: Vec<(usize, usize)>,
    offset: usize,
    height: usize,
}

impl FollowupModal {
    pub fn new(options: Vec<FollowupOption>) -> Self {
        let mut lines = Vec::new();
        let mut ranges = Vec::with_capacity(options.len());

        for (i, option) in options.iter().enumerate() {
            if i > 0 {
                lines.push(BodyLine {
                    option: None,
                    first: false,
                    text: String::new(),
                });
            }
            let start = lines.len();
            let label = format!("{}: {}", option.key, option.description);
            let options =
                textwrap::Options::new(TEXT_WIDTH).wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
            for (j, wrapped) in textwrap::wrap(&label, options).into_iter().enumerate() {
                lines.push(BodyLine {
                    option: Some(i),
                    first: j == 0,
                    text: wrapped.into_owned(),
                });
            }
            ranges.push((start, lines.len().saturating_sub(1).max(start)));
        }

        Self {
            options,
            selected: 0,
            lines,
            ranges,
            offset: 0,
            height: BODY_HEIGHT as usize,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    fn move_selection(&mut self, direction: Direction) {
        let count = self.options.len();
        if count == 0 {
            return;
        }
        self.selected = match direction {
            Direction::Up => (self.selected + count - 1) % count,
            Direction::Down => (self.selected + 1) % count,
        };
        self.auto_scroll(direction);
    }

    fn auto_scroll(&mut self, direction: Direction) {
        let Some(&(start, end)) = self.ranges.get(self.selected) else {
            return;
        };
        let height = self.height.max(1);
        let target_end = self
            .ranges
            .get(self.selected + 1)
            .map_or(end, |&(_, next_end)| next_end);

        if target_end - start + 1 <= height {
            if start < self.offset {
                self.offset = start;
            } else if target_end >= self.offset + height {
                self.offset = target_end + 1 - height;
            }
        } else if end - start < height {
            self.offset = match direction {
                Direction::Up => start,
                Direction::Down => (end + 1).saturating_sub(height),
            };
        } else {
            self.offset = start;
        }
    }

    fn body(&self) -> Vec<Line<'static>> {
        let highlight = Style::default().add_modifier(Modifier::BOLD);
        self.lines
            .iter()
            .skip(self.offset)
            .take(self.height)
            .map(|line| {
                let selected = line.option == Some(self.selected);
                let prefix = match (line.first, selected) {
                    (true, true) => MARKER,
                    (true, false) => NO_MARKER,
                    (false, _) if line.option.is_some() => CONTINUATION,
                    _ => "",
                };
                let text = format!("{prefix}{}", line.text);
                if selected {
                    Line::styled(text, highlight)
                } else {
                    Line::from(text)
                }
            })
            .collect()
    }
}

impl EventHandler for FollowupModal {
    /// The chosen key, or empty when dismissed.
    type Event = String;

    fn handle_event(&mut self, message: &Message) -> Option<Self::Event> {
        let Message::Key(key) = message else {
            return None;
        };
        match key.code {
            KeyCode::Esc => return Some(String::new()),
            KeyCode::Enter => return self.options.get(self.selected).map(|o| o.key.clone()),
            KeyCode::Up => self.move_selection(Direction::Up),
            KeyCode::Down => self.move_selection(Direction::Down),
            KeyCode::PageUp => self.offset = self.offset.saturating_sub(self.height),
            KeyCode::PageDown => {
                self.offset = (self.offset + self.height).min(self.max_offset());
            }
            _ => {}
        }
        None
    }
}

impl Component for FollowupModal {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_fixed(MODAL_WIDTH + 2, BODY_HEIGHT + CHROME_ROWS, area);
        if overlay.width == 0 || overlay.height == 0 {
            return;
        }
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(OVERLAY_BORDER))
            .style(Style::default().bg(OVERLAY_BG).fg(OVERLAY_FG))
            .padding(Padding::new(2, 2, 1, 1));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [header, _, body, _, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .areas(inner);

        // Keep the scroll math in step with the space we actually got.
        self.height = (body.height as usize).max(1);
        self.offset = self.offset.min(self.max_offset());

        frame.render_widget(Paragraph::new(HEADER), header);
        frame.render_widget(Paragraph::new(self.body()), body);
        frame.render_widget(
            Paragraph::new(FOOTER)
                .style(Style::default().fg(OVERLAY_HINT))
                .wrap(Wrap { trim: true }),
            footer,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn option(key: &str, description: &str) -> FollowupOption {
        FollowupOption {
            key: key.into(),
            description: description.into(),
        }
    }

    fn press(modal: &mut FollowupModal, code: KeyCode) -> Option<String> {
        modal.handle_event(&Message::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn three() -> FollowupModal {
        FollowupModal::new(vec![
            option("F1", "Do X"),
            option("F2", "Do Y"),
            option("F3", "Do Z"),
        ])
    }

    #[test]
    fn test_up_wraps_to_last() {
        let mut modal = three();
        assert_eq!(modal.selected(), 0);
        press(&mut modal, KeyCode::Up);
        assert_eq!(modal.selected(), 2);
        press(&mut modal, KeyCode::Down);
        assert_eq!(modal.selected(), 0);
    }

    #[test]
    fn test_enter_and_escape() {
        let mut modal = three();
        press(&mut modal, KeyCode::Down);
        assert_eq!(press(&mut modal, KeyCode::Enter).as_deref(), Some("F2"));
        assert_eq!(press(&mut modal, KeyCode::Esc).as_deref(), Some(""));
        assert_eq!(press(&mut modal, KeyCode::Char('x')), None);
    }

    #[test]
    fn test_layout_separates_options() {
        let modal = three();
        assert_eq!(modal.ranges, vec![(0, 0), (2, 2), (4, 4)]);
        let body: Vec<String> = modal.body().iter().map(|l| l.to_string()).collect();
        assert_eq!(body, vec![" > F1: Do X", "", "   F2: Do Y", "", "   F3: Do Z"]);
    }

    #[test]
    fn test_long_options_wrap_with_indent() {
        let modal = FollowupModal::new(vec![option("F1", &"word ".repeat(20))]);
        let body: Vec<String> = modal.body().iter().map(|l| l.to_string()).collect();
        assert!(body.len() > 1);
        assert!(body[0].starts_with(" > F1: word"));
        assert!(body[1].starts_with("     word"));
    }

    #[test]
    fn test_scroll_keeps_next_option_visible() {
        let mut modal = three();
        modal.height = 3;

        press(&mut modal, KeyCode::Down);
        // F2 and F3 both shown.
        assert_eq!(modal.offset, 2);
        press(&mut modal, KeyCode::Down);
        assert_eq!(modal.offset, 2);
        // Wrapping back to the first option scrolls to the top.
        press(&mut modal, KeyCode::Down);
        assert_eq!(modal.offset, 0);
    }

    #[test]
    fn test_scroll_anchors_lone_option_by_direction() {
        let mut modal = FollowupModal::new(vec![
            option("F1", "one\nmore"),
            option("F2", "two\nmore"),
            option("F3", "three\nmore"),
        ]);
        assert_eq!(modal.ranges, vec![(0, 1), (3, 4), (6, 7)]);
        modal.height = 3;

        // F2 plus F3 do not fit: F2 sits on the bottom edge.
        press(&mut modal, KeyCode::Down);
        assert_eq!(modal.offset, 2);

        press(&mut modal, KeyCode::Down);
        assert_eq!(modal.offset, 5);

        // Moving up pins F2 to the top edge.
        press(&mut modal, KeyCode::Up);
        assert_eq!(modal.offset, 3);
    }

    #[test]
    fn test_page_keys_clamp() {
        let mut modal = three();
        modal.height = 2;
        press(&mut modal, KeyCode::PageDown);
        assert_eq!(modal.offset, 2);
        press(&mut modal, KeyCode::PageDown);
        assert_eq!(modal.offset, 3);
        press(&mut modal, KeyCode::PageUp);
        press(&mut modal, KeyCode::PageUp);
        assert_eq!(modal.offset, 0);
    }

    #[test]
    fn test_render() {
        let backend = TestBackend::new(80, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut modal = three();

        terminal.draw(|f| modal.render(f, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let text = buffer.content().iter().map(|c| c.symbol()).collect::<String>();
        assert!(text.contains("Follow-up Options"));
        assert!(text.contains(" > F1: Do X"));
        assert!(text.contains("Esc: dismiss"));
    }
}
