//! # History Component
//!
//! Table of conversations shown in the top box instead of the transcript.
//! Up/Down move the selection and Enter opens the selected conversation.
//! Keys are ignored unless the top region has focus.
//!
//! Rows arrive as `ConversationRows` messages; the agent controller sends them
//! on startup and whenever this screen is entered.

use chrono::{DateTime, Local, TimeDelta};
use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Row, Table, TableState};

use crate::core::engine::ConversationSummary;
use crate::tui::component::{Component, EventHandler};
use crate::tui::message::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub name: String,
    pub tokens: String,
    pub started: String,
    pub duration: String,
}

impl HistoryRow {
    fn from_summary(summary: &ConversationSummary) -> Self {
        Self {
            name: summary.name.clone(),
            tokens: format!("{} tokens", summary.live_tokens),
            started: format_time(summary.started_at),
            duration: human_duration(summary.last_activity - summary.started_at),
        }
    }
}

pub struct History {
    rows: Vec<HistoryRow>,
    table_state: TableState,
    /// Whether the top region has focus (Prop)
    pub focused: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            table_state: TableState::default(),
            focused: false,
        }
    }

    /// Replace the rows. Conversations without live tokens are left out.
    pub fn set_rows(&mut self, summaries: &[ConversationSummary]) {
        self.rows = summaries
            .iter()
            .filter(|s| s.live_tokens > 0)
            .map(HistoryRow::from_summary)
            .collect();
        let selected = match self.table_state.selected() {
            _ if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }
}

impl EventHandler for History {
    /// Name of the conversation to open.
    type Event = String;

    fn handle_event(&mut self, message: &Message) -> Option<Self::Event> {
        let Message::Key(key) = message else {
            return None;
        };
        if !self.focused || self.rows.is_empty() {
            return None;
        }

        let last = self.rows.len() - 1;
        let selected = self.table_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Up => self.table_state.select(Some(selected.saturating_sub(1))),
            KeyCode::Down => self.table_state.select(Some((selected + 1).min(last))),
            KeyCode::Enter => return self.rows.get(selected).map(|row| row.name.clone()),
            _ => {}
        }
        None
    }
}

impl Component for History {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let header = Row::new(["Name", "Tokens", "Start", "Duration"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.rows.iter().map(|row| {
            Row::new([
                row.name.clone(),
                row.tokens.clone(),
                row.started.clone(),
                row.duration.clone(),
            ])
        });
        let highlight = if self.focused {
            Style::default().fg(Color::White).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(30),
                Constraint::Length(12),
                Constraint::Length(20),
                Constraint::Fill(1),
            ],
        )
        .header(header)
        .row_highlight_style(highlight);

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }
}

fn format_time(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

/// "1 day, 2 hours, 3 minutes"; under a minute reads "less than a minute".
pub fn human_duration(delta: TimeDelta) -> String {
    let delta = delta.abs();
    let days = delta.num_days();
    let hours = delta.num_hours() % 24;
    let minutes = delta.num_minutes() % 60;

    let unit = |n: i64, name: &str| {
        let plural = if n == 1 { "" } else { "s" };
        format!("{n} {name}{plural}")
    };

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(unit(days, "day"));
    }
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }

    if parts.is_empty() {
        "less than a minute".to_string()
    } else {
        parts.join(", ")
    }
}
