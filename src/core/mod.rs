//! # Core Logic
//!
//! Everything in here is independent of the terminal toolkit. The `tui`
//! module drives these pieces; nothing in `core` knows about ratatui or
//! crossterm.
//!
//! ```text
//!   tui (ratatui, crossterm) ──► core ◄── inference (reqwest)
//! ```
//!
//! ## Modules
//!
//! - [`layout`]: proportional region sizes and the bordered view tree
//! - [`followup`]: extracts `(F<n>)` options from model text
//! - [`tools`]: command templates, tool declarations, builtin registry
//! - [`engine`]: the interface consumed from the conversation engine
//! - [`config`]: `~/.ctxagent/config.toml` loading and resolution

pub mod config;
pub mod engine;
pub mod followup;
pub mod layout;
pub mod tools;
