//! # StatusBar Component
//!
//! One row at the top of the screen:
//!
//! ```text
//!  ●∙∙ | 12% full                                   grep | 3 tools
//! ```
//!
//! Everything shown is derived from bus messages: `Working` starts and stops
//! the spinner, `TokenUsage` sets the percentage, and tool events set the
//! active tool name and count finished calls.

use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

use crate::core::engine::EngineEvent;
use crate::tui::command::Command;
use crate::tui::component::{Component, Update};
use crate::tui::message::Message;

const SPINNER_FRAMES: [&str; 4] = ["∙∙∙", "●∙∙", "∙●∙", "∙∙●"];
const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

const STATUS_FG: Color = Color::Rgb(0x17, 0x27, 0x1a);
const STATUS_BG: Color = Color::Rgb(0xdd, 0x9f, 0x6b);

#[derive(Debug, Default)]
pub struct StatusBar {
    working: bool,
    frame: usize,
    usage_percent: f64,
    current_tool: String,
    tools_run: usize,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_working(&self) -> bool {
        self.working
    }

    fn spinner(&self) -> &'static str {
        if self.working {
            SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()]
        } else {
            "   "
        }
    }

    /// The full row text, padded to `width` columns.
    pub fn line(&self, width: u16) -> String {
        let left = format!(" {} | {:.0}% full", self.spinner(), self.usage_percent);
        let right = format!("{} | {} tools ", self.current_tool, self.tools_run);

        let used = left.width() + right.width();
        let gap = (width as usize).saturating_sub(used);
        format!("{left}{}{right}", " ".repeat(gap))
    }

    fn tick() -> Command {
        Command::perform(async {
            tokio::time::sleep(SPINNER_INTERVAL).await;
            Some(Message::SpinnerTick)
        })
    }
}

impl Update for StatusBar {
    fn update(&mut self, message: &Message) -> Option<Command> {
        match message {
            Message::Working(true) => {
                let was_working = std::mem::replace(&mut self.working, true);
                (!was_working).then(Self::tick)
            }
            Message::Working(false) => {
                self.working = false;
                None
            }
            Message::SpinnerTick if self.working => {
                self.frame = self.frame.wrapping_add(1);
                Some(Self::tick())
            }
            Message::TokenUsage(percent) => {
                self.usage_percent = percent.clamp(0.0, 100.0);
                None
            }
            Message::Tool(EngineEvent::ToolCall { name, .. }) => {
                self.current_tool = name.clone();
                None
            }
            Message::Tool(EngineEvent::ToolResult { .. }) => {
                self.current_tool.clear();
                self.tools_run += 1;
                None
            }
            _ => None,
        }
    }
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = Style::default().fg(STATUS_FG).bg(STATUS_BG);
        frame.render_widget(Span::styled(self.line(area.width), style), area);
    }
}
