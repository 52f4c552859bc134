//! Presentation layer for research-beacon
//!
//! This crate contains the CLI definitions and the console renderer for
//! tracker events. It consumes the snapshot/subscription API of the
//! application layer and never reaches back into it.

pub mod cli;
pub mod console;

// Re-export commonly used types
pub use cli::{Cli, Command};
pub use console::{ConsolePresenter, render_history};
