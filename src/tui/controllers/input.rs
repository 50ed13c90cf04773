//! Turns submitted text into either a slash command or a prompt.

use log::info;

use crate::tui::command::Command;
use crate::tui::message::{EntryKind, Message};

use super::Controller;

#[derive(Debug, Default)]
pub struct InputController;

impl InputController {
    pub fn new() -> Self {
        Self
    }
}

impl Controller for InputController {
    fn name(&self) -> &'static str {
        "input"
    }

    fn update(&mut self, message: &Message) -> Option<Command> {
        let Message::InputSubmit(text) = message else {
            return None;
        };

        let trimmed = text.trim();
        if trimmed.starts_with('/') {
            return Some(match shell_words::split(trimmed) {
                Ok(words) => {
                    info!("Slash command: {words:?}");
                    Command::message(Message::SlashCommand(words))
                }
                Err(e) => Command::message(Message::transcript(
                    EntryKind::Error,
                    format!("Error: {e}\n"),
                )),
            });
        }

        Command::sequence([
            Some(Command::message(Message::transcript(
                EntryKind::Prompt,
                text.clone(),
            ))),
            Some(Command::message(Message::PromptSubmitted(text.clone()))),
        ])
    }
}
