//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the chronicler binary.

mod commands;
mod handlers;

pub use commands::{Cli, Commands, OutputFormat};
pub use handlers::{handle_next, handle_project_command};
