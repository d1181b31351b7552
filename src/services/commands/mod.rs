//! Chat command front-end.
//!
//! - `Command`: parsed chat commands
//! - `CommandService`: subscription changes and cached block lookups
//! - `CommandListener`: long-polling loop answering commands

mod handler;
mod listener;
mod parser;

pub use handler::{BlockLookup, CommandService};
pub use listener::{process_updates, CommandListener, UpdateSource};
pub use parser::Command;
