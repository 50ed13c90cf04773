//! # Command Templates
//!
//! A tool's `command` is a small template language:
//!
//! ```text
//! tcpdump -n tcp [and port {port}] -c {count}
//!                └──── clause ────┘    └─┬─┘
//!                                    placeholder
//! ```
//!
//! - `{name}` is replaced by the argument's textual form.
//! - `[ ... ]` is an optional clause. It survives (brackets stripped) only when
//!   every placeholder inside it has a non-null argument; otherwise the whole
//!   clause disappears.
//! - Clauses do not nest. A `[` with no `]` before the next `[` is plain text,
//!   and so is a `{` that does not close a valid identifier.
//!
//! The template is lexed once into [`Segment`]s. Compiling against an
//! argument object yields an argv, which [`execute`] runs as a child process.

use std::io::Read;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Parameters, ToolError, ToolRunner, ToolTemplate, decode_arguments};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Piece(Piece),
    Clause(Vec<Piece>),
}

/// A lexed command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = source;

        while !rest.is_empty() {
            match clause_span(rest) {
                Some((before, inner, after)) => {
                    segments.extend(lex_pieces(before).into_iter().map(Segment::Piece));
                    segments.push(Segment::Clause(lex_pieces(inner)));
                    rest = after;
                }
                None => {
                    segments.extend(lex_pieces(rest).into_iter().map(Segment::Piece));
                    rest = "";
                }
            }
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve clauses and placeholders, then split into argv.
    ///
    /// Required parameters are checked in name order; the first one missing
    /// is reported. Placeholders that are undeclared or unsupplied are left
    /// as literal `{name}` text.
    pub fn compile(
        &self,
        parameters: &Parameters,
        args: &Map<String, Value>,
    ) -> Result<Vec<String>, ToolError> {
        if let Some((name, _)) = parameters
            .iter()
            .find(|(name, param)| param.required && supplied(args, name).is_none())
        {
            return Err(ToolError::MissingParameter(name.clone()));
        }

        let mut line = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Piece(piece) => render_piece(&mut line, piece, parameters, args),
                Segment::Clause(pieces) => {
                    let satisfied = pieces.iter().all(|piece| match piece {
                        Piece::Placeholder(name) => supplied(args, name).is_some(),
                        Piece::Text(_) => true,
                    });
                    if satisfied {
                        for piece in pieces {
                            render_piece(&mut line, piece, parameters, args);
                        }
                    }
                }
            }
        }

        let argv: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            return Err(ToolError::EmptyCommand);
        }
        Ok(argv)
    }
}

/// The first well-formed clause: `(text before, inner, text after)`.
///
/// A `[` only opens a clause if a `]` follows before any other `[` and the
/// inner text is non-empty. Otherwise it is literal and the search moves on.
fn clause_span(text: &str) -> Option<(&str, &str, &str)> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('[') {
        let open = search_from + offset;
        let body = &text[open + 1..];
        let close = body.find(']');
        let reopen = body.find('[');

        if let Some(close) = close
            && close > 0
            && reopen.is_none_or(|r| r > close)
        {
            return Some((&text[..open], &body[..close], &body[close + 1..]));
        }
        search_from = open + 1;
    }

    None
}

fn lex_pieces(text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let ident_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if ident_len > 0 && after[ident_len..].starts_with('}') {
            if !literal.is_empty() {
                pieces.push(Piece::Text(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Placeholder(after[..ident_len].to_string()));
            rest = &after[ident_len + 1..];
        } else {
            literal.push('{');
            rest = after;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        pieces.push(Piece::Text(literal));
    }
    pieces
}

fn supplied<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    args.get(name).filter(|value| !value.is_null())
}

fn render_piece(line: &mut String, piece: &Piece, parameters: &Parameters, args: &Map<String, Value>) {
    match piece {
        Piece::Text(text) => line.push_str(text),
        Piece::Placeholder(name) => {
            match supplied(args, name).filter(|_| parameters.contains_key(name)) {
                Some(Value::String(s)) => line.push_str(s),
                Some(value) => line.push_str(&value.to_string()),
                None => {
                    line.push('{');
                    line.push_str(name);
                    line.push('}');
                }
            }
        }
    }
}

/// Run argv and capture its output. Stdout and stderr share one pipe, so
/// the text interleaves the way the program wrote it.
///
/// There is no timeout; dropping the future kills the child.
pub async fn execute(argv: &[String]) -> Result<String, ToolError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ToolError::EmptyCommand);
    };

    log::debug!("Tool exec: {:?}", argv);

    let launch_error = |e: std::io::Error| ToolError::Launch {
        program: program.clone(),
        message: e.to_string(),
    };

    let (mut reader, writer) = os_pipe::pipe().map_err(launch_error)?;
    let stderr_writer = writer.try_clone().map_err(launch_error)?;

    let mut command = tokio::process::Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer)
        .kill_on_drop(true);
    let mut child = command.spawn().map_err(launch_error)?;
    // The reader only sees EOF once every write end outside the child is closed.
    drop(command);

    let reading = tokio::task::spawn_blocking(move || {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map(|_| bytes)
    });
    let status = child.wait().await.map_err(launch_error)?;
    let bytes = reading
        .await
        .map_err(|e| launch_error(std::io::Error::other(e)))?
        .map_err(launch_error)?;
    let captured = String::from_utf8_lossy(&bytes).into_owned();

    if status.success() {
        log::debug!("Tool exit: {} ok ({} bytes)", program, captured.len());
        Ok(captured)
    } else {
        log::warn!("Tool exit: {} {}", program, status);
        Err(ToolError::Failed {
            status: status.to_string(),
            output: captured,
        })
    }
}

/// A declared external-command tool bound to its lexed template.
pub struct TemplateTool {
    template: CommandTemplate,
    parameters: Parameters,
}

impl TemplateTool {
    pub fn new(tool: &ToolTemplate) -> Self {
        Self {
            template: CommandTemplate::parse(&tool.command),
            parameters: tool.parameters.clone(),
        }
    }
}

#[async_trait]
impl ToolRunner for TemplateTool {
    async fn run(&self, arguments: &str) -> Result<String, ToolError> {
        let args = decode_arguments(arguments)?;
        let argv = self.template.compile(&self.parameters, &args)?;
        execute(&argv).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tools::{ParameterType, ToolParameter};
    use serde_json::json;

    fn params(entries: &[(&str, ParameterType, bool)]) -> Parameters {
        entries
            .iter()
            .map(|(name, kind, required)| {
                (
                    name.to_string(),
                    ToolParameter {
                        kind: *kind,
                        description: String::new(),
                        required: *required,
                    },
                )
            })
            .collect()
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test args must be an object"),
        }
    }

    fn echo_params() -> Parameters {
        params(&[
            ("verbose", ParameterType::String, false),
            ("message", ParameterType::String, true),
        ])
    }

    #[test]
    fn test_optional_clause_dropped() {
        let template = CommandTemplate::parse("echo [-v {verbose}] {message}");
        let argv = template
            .compile(&echo_params(), &args(json!({"message": "hi"})))
            .unwrap();
        assert_eq!(argv, vec!["echo", "hi"]);
    }

    #[test]
    fn test_optional_clause_kept() {
        let template = CommandTemplate::parse("echo [-v {verbose}] {message}");
        let argv = template
            .compile(
                &echo_params(),
                &args(json!({"verbose": "true", "message": "hi"})),
            )
            .unwrap();
        assert_eq!(argv, vec!["echo", "-v", "true", "hi"]);
    }

    #[test]
    fn test_missing_required_names_parameter() {
        let template = CommandTemplate::parse("echo [-v {verbose}] {message}");
        let err = template.compile(&echo_params(), &Map::new()).unwrap_err();
        assert_eq!(err, ToolError::MissingParameter("message".into()));
        assert!(err.to_string().contains("message"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let template = CommandTemplate::parse("echo [-v {verbose}] {message}");
        let err = template
            .compile(&echo_params(), &args(json!({"message": null})))
            .unwrap_err();
        assert_eq!(err, ToolError::MissingParameter("message".into()));

        let argv = template
            .compile(&echo_params(), &args(json!({"verbose": null, "message": "x"})))
            .unwrap();
        assert_eq!(argv, vec!["echo", "x"]);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let template = CommandTemplate::parse("grep [-m {max}] [-C {ctx}] {pattern} {path}");
        let p = params(&[
            ("max", ParameterType::Number, false),
            ("ctx", ParameterType::Number, false),
            ("pattern", ParameterType::String, true),
            ("path", ParameterType::String, true),
        ]);
        let a = args(json!({"ctx": 2, "pattern": "fn", "path": "src"}));

        let first = template.compile(&p, &a).unwrap();
        for _ in 0..10 {
            assert_eq!(template.compile(&p, &a).unwrap(), first);
        }
        assert_eq!(first, vec!["grep", "-C", "2", "fn", "src"]);
    }

    #[test]
    fn test_clauses_sharing_placeholders_are_judged_independently() {
        let template = CommandTemplate::parse("cmd [--a {x}] [--b {x} {y}]");
        let p = params(&[
            ("x", ParameterType::String, false),
            ("y", ParameterType::String, false),
        ]);

        let argv = template.compile(&p, &args(json!({"x": "1"}))).unwrap();
        assert_eq!(argv, vec!["cmd", "--a", "1"]);

        let argv = template.compile(&p, &args(json!({"x": "1", "y": "2"}))).unwrap();
        assert_eq!(argv, vec!["cmd", "--a", "1", "--b", "1", "2"]);
    }

    #[test]
    fn test_nested_and_unmatched_brackets_are_literal() {
        let template = CommandTemplate::parse("echo [a [b {x}] c");
        let p = params(&[("x", ParameterType::String, false)]);

        // "[a " is literal, "[b {x}]" is the clause
        let argv = template.compile(&p, &Map::new()).unwrap();
        assert_eq!(argv, vec!["echo", "[a", "c"]);

        let template = CommandTemplate::parse("echo ] [] [");
        let argv = template.compile(&p, &Map::new()).unwrap();
        assert_eq!(argv, vec!["echo", "]", "[]", "["]);
    }

    #[test]
    fn test_adjacent_placeholders() {
        let template = CommandTemplate::parse("echo {a}{b}");
        let p = params(&[
            ("a", ParameterType::String, true),
            ("b", ParameterType::Number, true),
        ]);
        let argv = template.compile(&p, &args(json!({"a": "x", "b": 3}))).unwrap();
        assert_eq!(argv, vec!["echo", "x3"]);
    }

    #[test]
    fn test_undeclared_placeholder_stays_literal() {
        let template = CommandTemplate::parse("echo {known} {unknown} {not valid}");
        let p = params(&[("known", ParameterType::String, true)]);
        let argv = template
            .compile(&p, &args(json!({"known": "k", "unknown": "u"})))
            .unwrap();
        assert_eq!(argv, vec!["echo", "k", "{unknown}", "{not", "valid}"]);
    }

    #[test]
    fn test_whitespace_collapses() {
        let template = CommandTemplate::parse("  ls \t [-l {long}]   {dir}  ");
        let p = params(&[
            ("long", ParameterType::String, false),
            ("dir", ParameterType::String, true),
        ]);
        let argv = template.compile(&p, &args(json!({"dir": "/tmp"}))).unwrap();
        assert_eq!(argv, vec!["ls", "/tmp"]);
    }

    #[test]
    fn test_empty_template_is_an_error() {
        let template = CommandTemplate::parse("[{x}]");
        let p = params(&[("x", ParameterType::String, false)]);
        assert_eq!(
            template.compile(&p, &Map::new()).unwrap_err(),
            ToolError::EmptyCommand
        );
    }

    #[test]
    fn test_lexer_segments() {
        let template = CommandTemplate::parse("a [b {c}] {d}");
        assert_eq!(
            template.segments(),
            &[
                Segment::Piece(Piece::Text("a ".into())),
                Segment::Clause(vec![
                    Piece::Text("b ".into()),
                    Piece::Placeholder("c".into())
                ]),
                Segment::Piece(Piece::Text(" ".into())),
                Segment::Piece(Piece::Placeholder("d".into())),
            ]
        );
        assert_eq!(template.source(), "a [b {c}] {d}");
    }

    #[tokio::test]
    async fn test_execute_captures_output() {
        let out = execute(&["echo".into(), "hello".into()]).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn test_execute_nonzero_exit_keeps_output() {
        let argv = vec!["sh".into(), "-c".into(), "echo oops; exit 3".into()];
        match execute(&argv).await {
            Err(ToolError::Failed { output, .. }) => assert_eq!(output, "oops\n"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_interleaves_stderr_in_write_order() {
        let argv = vec![
            "sh".into(),
            "-c".into(),
            "echo err >&2; sleep 0.1; echo out".into(),
        ];
        assert_eq!(execute(&argv).await.unwrap(), "err\nout\n");
    }

    #[tokio::test]
    async fn test_execute_missing_program() {
        let argv = vec!["definitely-not-a-real-program-xyz".to_string()];
        assert!(matches!(
            execute(&argv).await,
            Err(ToolError::Launch { .. })
        ));
    }

    #[tokio::test]
    async fn test_template_tool_runs() {
        let tool = TemplateTool::new(&ToolTemplate {
            name: "say".into(),
            description: "echo a message".into(),
            command: "echo [-n {no_newline}] {message}".into(),
            parameters: params(&[
                ("no_newline", ParameterType::String, false),
                ("message", ParameterType::String, true),
            ]),
        });

        assert_eq!(tool.run(r#"{"message":"hi there"}"#).await.unwrap(), "hi there\n");
        assert!(matches!(
            tool.run("{}").await,
            Err(ToolError::MissingParameter(name)) if name == "message"
        ));
    }
}
