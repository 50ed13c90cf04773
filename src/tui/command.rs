//! # Commands
//!
//! A [`Command`] is deferred work that yields at most one [`Message`].
//!
//! ```text
//!  Perform(fut)      run fut, post its message
//!  Batch([a, b])     run a and b concurrently, no ordering
//!  Sequence([a, b])  run a, wait until its message has been dispatched,
//!                    then run b
//! ```
//!
//! The [`Scheduler`] spawns commands on the tokio runtime and posts their
//! messages to the dispatch loop. Messages produced inside a sequence carry an
//! acknowledgement that the loop fires after `update` returns; the next
//! element starts only then.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::future::{BoxFuture, FutureExt, join_all};
use tokio::sync::{mpsc, oneshot};

use super::message::Message;

pub type Effect = Pin<Box<dyn Future<Output = Option<Message>> + Send>>;

pub enum Command {
    Perform(Effect),
    Sequence(Vec<Command>),
    Batch(Vec<Command>),
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Perform(_) => write!(f, "Perform(..)"),
            Command::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Command::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
        }
    }
}

impl Command {
    pub fn perform<F>(future: F) -> Self
    where
        F: Future<Output = Option<Message>> + Send + 'static,
    {
        Command::Perform(Box::pin(future))
    }

    /// A command that just posts `message`.
    pub fn message(message: Message) -> Self {
        Command::perform(async move { Some(message) })
    }

    /// Strictly ordered commands. Empty input gives `None`; a single command
    /// is returned as is.
    pub fn sequence(commands: impl IntoIterator<Item = Option<Command>>) -> Option<Command> {
        collapse(commands, Command::Sequence)
    }

    /// Independent commands.
    pub fn batch(commands: impl IntoIterator<Item = Option<Command>>) -> Option<Command> {
        collapse(commands, Command::Batch)
    }

    /// Run every effect in order (batches too) and collect the messages
    /// without dispatching them.
    #[cfg(test)]
    pub fn collect(self) -> BoxFuture<'static, Vec<Message>> {
        async move {
            match self {
                Command::Perform(effect) => effect.await.into_iter().collect(),
                Command::Sequence(cmds) | Command::Batch(cmds) => {
                    let mut messages = Vec::new();
                    for cmd in cmds {
                        messages.extend(cmd.collect().await);
                    }
                    messages
                }
            }
        }
        .boxed()
    }
}

fn collapse(
    commands: impl IntoIterator<Item = Option<Command>>,
    wrap: fn(Vec<Command>) -> Command,
) -> Option<Command> {
    let mut commands: Vec<Command> = commands.into_iter().flatten().collect();
    match commands.len() {
        0 => None,
        1 => commands.pop(),
        _ => Some(wrap(commands)),
    }
}

/// A message on its way to the dispatch loop.
pub struct Envelope {
    pub message: Message,
    /// Fired after the loop has run `update` for `message`.
    pub ack: Option<oneshot::Sender<()>>,
}

impl Envelope {
    pub fn acknowledge(&mut self) {
        if let Some(ack) = self.ack.take() {
            let _ = ack.send(());
        }
    }
}

#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl Scheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post a message directly.
    pub fn post(&self, message: Message) {
        if self.tx.send(Envelope { message, ack: None }).is_err() {
            log::warn!("Dispatch loop gone, dropping message");
        }
    }

    /// Run `command` in the background.
    pub fn spawn(&self, command: Command) {
        tokio::spawn(self.clone().run(command, false));
    }

    fn run(self, command: Command, ordered: bool) -> BoxFuture<'static, ()> {
        async move {
            match command {
                Command::Perform(effect) => {
                    let Some(message) = effect.await else {
                        return;
                    };
                    if !ordered {
                        self.post(message);
                        return;
                    }

                    let (ack, dispatched) = oneshot::channel();
                    let envelope = Envelope {
                        message,
                        ack: Some(ack),
                    };
                    if self.tx.send(envelope).is_ok() {
                        // An error only means the loop exited.
                        let _ = dispatched.await;
                    }
                }
                Command::Sequence(cmds) => {
                    for cmd in cmds {
                        self.clone().run(cmd, true).await;
                    }
                }
                Command::Batch(cmds) => {
                    join_all(cmds.into_iter().map(|cmd| self.clone().run(cmd, ordered))).await;
                }
            }
        }
        .boxed()
    }
}
