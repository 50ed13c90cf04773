//! # TUI Components
//!
//! ## Component Architecture
//!
//! Each component owns its presentation state and implements some of:
//!
//! - [`Component`](super::component::Component): render into a `Rect`
//! - [`EventHandler`](super::component::EventHandler): turn key input into a
//!   high-level event for the root window
//! - [`Update`](super::component::Update): react to bus messages, possibly
//!   returning a command
//!
//! Props the root window owns (such as focus) are plain `pub` fields that
//! the root sets before dispatching.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs             (this file)
//! ├── status_bar.rs      (spinner, usage, active tool)
//! ├── viewport.rs        (wrapped transcript in a scroll view)
//! ├── history.rs         (conversation table)
//! ├── textarea/          (multi-line prompt editor)
//! ├── followup_modal.rs  (followup option picker)
//! ├── help_modal.rs      (key and command reference)
//! └── overlay.rs         (shared overlay geometry and colors)
//! ```

pub mod followup_modal;
pub mod help_modal;
pub mod history;
mod overlay;
pub mod status_bar;
pub mod textarea;
pub mod viewport;

pub use followup_modal::FollowupModal;
pub use help_modal::HelpModal;
pub use history::History;
pub use status_bar::StatusBar;
pub use textarea::{TextArea, TextAreaEvent};
pub use viewport::Viewport;
