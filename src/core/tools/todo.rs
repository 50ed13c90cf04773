//! # Todo
//!
//! A scratch list the model can use for planning multi-step work.

use std::fmt::Write as _;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use super::{ToolError, ToolRunner};

pub const NAME: &str = "todo";

pub const DECLARATION: &str = r#"
name = "todo"
description = """
Manage a list of todo steps; good for multistep processes, internal planning, scratch memory.

You MUST call this tool with an "action".

tool({"action":"add", "entry":"a cool new todo list entry"})

"add" adds elements to the list.
"list" gives a numbered list of the current todo elements.
"delete" deletes a numbered entry from the list.
"""

[parameters]
action = { type = "string", description = "add or delete or list", required = true }
entry = { type = "string", description = "A blob of text to add to the todo list", required = false }
number = { type = "number", description = "The number of an entry to delete", required = false }
"#;

#[derive(Default)]
pub struct Todo {
    entries: Mutex<Vec<String>>,
}

#[derive(Deserialize)]
struct TodoArgs {
    action: Option<String>,
    entry: Option<String>,
    number: Option<f64>,
}

#[async_trait]
impl ToolRunner for Todo {
    async fn run(&self, arguments: &str) -> Result<String, ToolError> {
        log::info!("todo run: {}", arguments);

        let args: TodoArgs = serde_json::from_str(if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        })
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ToolError::Builtin("todo list unavailable".into()))?;
        let mut out = String::new();

        match args.action.as_deref() {
            Some("add") => {
                let entry = args.entry.ok_or_else(|| ToolError::Builtin("no entry".into()))?;
                entries.push(entry);
            }
            Some("list") => {
                out.push_str("<todo_entries>\n");
                for (i, entry) in entries.iter().enumerate() {
                    let _ = writeln!(out, "{}. {}", i + 1, entry);
                }
                out.push_str("</todo_entries>\n");
            }
            Some("delete") => {
                let number = args
                    .number
                    .filter(|n| n.fract() == 0.0 && *n >= 1.0)
                    .ok_or_else(|| ToolError::Builtin("no number".into()))?
                    as usize;
                if number <= entries.len() {
                    entries.remove(number - 1);
                    let _ = writeln!(out, "deleted {number}");
                }
            }
            Some(other) => return Err(ToolError::Builtin(format!("invalid action {other}"))),
            None => return Err(ToolError::Builtin("no valid action".into())),
        }

        Ok(out)
    }
}
