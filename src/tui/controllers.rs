//! # Controllers
//!
//! Controllers handle messages without drawing anything. The chain is fixed at
//! startup; every dispatch pass offers the same message to each controller in
//! order, and whatever commands come back run as one [`Command::Sequence`].
//!
//! ```text
//!  message ──► input ──► agent ──► slash
//!                │         │         │
//!                └─────────┴─────────┴──► Sequence(cmds)
//! ```

pub mod agent;
pub mod input;
pub mod slash;

use log::debug;

use super::command::Command;
use super::message::Message;

pub use agent::AgentController;
pub use input::InputController;
pub use slash::SlashController;

pub trait Controller: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn update(&mut self, message: &Message) -> Option<Command>;
}

pub struct ControllerChain {
    controllers: Vec<Box<dyn Controller>>,
}

impl ControllerChain {
    pub fn new(controllers: Vec<Box<dyn Controller>>) -> Self {
        Self { controllers }
    }

    pub fn update(&mut self, message: &Message) -> Option<Command> {
        let commands: Vec<Option<Command>> = self
            .controllers
            .iter_mut()
            .map(|controller| {
                let command = controller.update(message);
                if let Some(command) = &command {
                    debug!("Controller {} -> {:?}", controller.name(), command);
                }
                command
            })
            .collect();

        Command::sequence(commands)
    }
}
