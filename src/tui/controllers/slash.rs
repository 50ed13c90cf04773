//! Slash commands typed into the input box.
//!
//! The first word, lower-cased, picks the handler. Unknown commands do
//! nothing. Results are shown as transcript entries; failures read
//! `Error: ...`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, info};

use crate::core::engine::{Record, RecordSource, SharedEngine};
use crate::tui::command::Command;
use crate::tui::message::{EntryKind, Message};

use super::Controller;

/// `(usage, summary)` for every command, in help order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/help", "list commands"),
    ("/dump <file.md>", "export the conversation as Markdown"),
    ("/new [name]", "start a new conversation"),
    ("/switch <name>", "switch to an existing conversation"),
    ("/list", "list conversations"),
];

pub struct SlashController {
    engine: SharedEngine,
}

impl SlashController {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    fn dispatch(&self, words: &[String]) -> Option<Command> {
        let name = words.first()?.to_lowercase();
        let args = &words[1..];

        match name.as_str() {
            "/help" => Some(result(help_text())),
            "/dump" => Some(self.dump(args)),
            "/new" => Some(new_conversation(args)),
            "/switch" => Some(self.switch(args)),
            "/list" => Some(self.list()),
            _ => {
                debug!("Ignoring unknown slash command {name}");
                None
            }
        }
    }

    fn dump(&self, args: &[String]) -> Command {
        let Some(path) = args.first().cloned() else {
            return error("/dump <filename.md>");
        };
        let engine = self.engine.clone();
        Command::perform(async move {
            let records = engine.lock().await.live_records();
            Some(match write_export(Path::new(&path), &records) {
                Ok(()) => {
                    info!("Exported {} records to {}", records.len(), path);
                    result_message(format!("Exported {} records to {path}", records.len()))
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    error_message(format!("/dump: file {path} already exists"))
                }
                Err(e) => error_message(format!("/dump: write to {path}: {e}")),
            })
        })
    }

    fn switch(&self, args: &[String]) -> Command {
        let Some(name) = args.first().cloned() else {
            return error("/switch <name>");
        };
        let engine = self.engine.clone();
        Command::perform(async move {
            let known = engine
                .lock()
                .await
                .list_conversations()
                .iter()
                .any(|c| c.name == name);
            Some(if known {
                Message::SelectConversation(name)
            } else {
                error_message(format!("/switch: no conversation named {name}"))
            })
        })
    }

    fn list(&self) -> Command {
        let engine = self.engine.clone();
        Command::perform(async move {
            let engine = engine.lock().await;
            let current = engine.current_conversation();
            let lines: Vec<String> = engine
                .list_conversations()
                .iter()
                .map(|c| {
                    let marker = if c.name == current { "*" } else { " " };
                    format!("{marker} {} ({} tokens)", c.name, c.live_tokens)
                })
                .collect();
            Some(result_message(lines.join("\n")))
        })
    }
}

impl Controller for SlashController {
    fn name(&self) -> &'static str {
        "slash"
    }

    fn update(&mut self, message: &Message) -> Option<Command> {
        match message {
            Message::SlashCommand(words) => self.dispatch(words),
            _ => None,
        }
    }
}

fn new_conversation(args: &[String]) -> Command {
    let name = args
        .first()
        .cloned()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    Command::message(Message::SelectConversation(name))
}

fn help_text() -> String {
    COMMANDS
        .iter()
        .map(|(usage, summary)| format!("{usage:<18} {summary}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn result_message(text: String) -> Message {
    Message::transcript(EntryKind::SlashResult, format!("{text}\n"))
}

fn error_message(text: String) -> Message {
    Message::transcript(EntryKind::Error, format!("Error: {text}\n"))
}

fn result(text: String) -> Command {
    Command::message(result_message(text))
}

fn error(text: &str) -> Command {
    Command::message(error_message(text.to_string()))
}

/// Render records as a Markdown document.
pub fn export_markdown(records: &[Record]) -> String {
    let mut out = String::from("# Conversation Export\n\n");
    for record in records {
        let section = match record.source {
            RecordSource::Prompt => format!("## User\n\n{}\n\n", record.content),
            RecordSource::ModelResponse => format!("## Assistant\n\n{}\n\n", record.content),
            RecordSource::ToolCall => format!("### Tool Call\n\n```\n{}\n```\n\n", record.content),
            RecordSource::ToolOutput => {
                format!("### Tool Output\n\n```\n{}\n```\n\n", record.content)
            }
        };
        out.push_str(&section);
    }
    out
}

/// Write the export to a new file. An existing file is never overwritten.
fn write_export(path: &Path, records: &[Record]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(export_markdown(records).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, shared_engine};
    use crate::tui::message::TranscriptEntry;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    async fn run(controller: &mut SlashController, line: &str) -> Vec<Message> {
        match controller.update(&Message::SlashCommand(words(line))) {
            Some(command) => command.collect().await,
            None => Vec::new(),
        }
    }

    fn entry(messages: &[Message]) -> &TranscriptEntry {
        match messages {
            [Message::Transcript(entry)] => entry,
            other => panic!("expected one transcript entry, got {other:?}"),
        }
    }

    async fn engine_with_history() -> SharedEngine {
        let engine = shared_engine(ScriptedProvider::replies(&["an answer"]));
        {
            let mut agent = engine.lock().await;
            agent.submit_prompt("a question").unwrap();
            agent.invoke_model().await.unwrap();
        }
        engine
    }

    #[test]
    fn test_export_markdown() {
        let records = vec![
            Record::new(RecordSource::Prompt, "hi"),
            Record::new(RecordSource::ToolCall, "ls({})"),
            Record::new(RecordSource::ToolOutput, "a.txt"),
            Record::new(RecordSource::ModelResponse, "one file"),
        ];
        assert_eq!(
            export_markdown(&records),
            "# Conversation Export\n\n\
             ## User\n\nhi\n\n\
             ### Tool Call\n\n```\nls({})\n```\n\n\
             ### Tool Output\n\n```\na.txt\n```\n\n\
             ## Assistant\n\none file\n\n"
        );
    }

    #[tokio::test]
    async fn test_dump_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        let line = format!("/DUMP {}", path.display());
        let mut controller = SlashController::new(engine_with_history().await);

        let messages = run(&mut controller, &line).await;
        let shown = entry(&messages);
        assert_eq!(shown.kind, EntryKind::SlashResult);
        assert_eq!(shown.text, format!("Exported 2 records to {}\n", path.display()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("## User\n\na question"));
        assert!(written.contains("## Assistant\n\nan answer"));

        let again = run(&mut controller, &line).await;
        let shown = entry(&again);
        assert_eq!(shown.kind, EntryKind::Error);
        assert_eq!(
            shown.text,
            format!("Error: /dump: file {} already exists\n", path.display())
        );
    }

    #[tokio::test]
    async fn test_dump_requires_path() {
        let mut controller = SlashController::new(engine_with_history().await);
        let messages = run(&mut controller, "/dump").await;
        assert_eq!(entry(&messages).text, "Error: /dump <filename.md>\n");
    }

    #[tokio::test]
    async fn test_new_and_switch() {
        let mut controller = SlashController::new(engine_with_history().await);

        let named = run(&mut controller, "/new research").await;
        assert!(matches!(named.as_slice(), [Message::SelectConversation(n)] if n == "research"));

        let generated = run(&mut controller, "/new").await;
        assert!(matches!(generated.as_slice(), [Message::SelectConversation(n)] if n.len() == 36));

        let known = run(&mut controller, "/switch main").await;
        assert!(matches!(known.as_slice(), [Message::SelectConversation(n)] if n == "main"));

        let unknown = run(&mut controller, "/switch nowhere").await;
        assert_eq!(entry(&unknown).kind, EntryKind::Error);
    }

    #[tokio::test]
    async fn test_help_list_and_unknown() {
        let mut controller = SlashController::new(engine_with_history().await);

        let help = run(&mut controller, "/help").await;
        assert!(entry(&help).text.contains("/dump <file.md>"));

        let list = run(&mut controller, "/list").await;
        assert!(entry(&list).text.starts_with("* main ("));

        assert!(run(&mut controller, "/bogus").await.is_empty());
    }
}
