//! CLI module for wikistore
//!
//! Provides command-line interface for:
//! - init: Create the data directory and session secret
//! - start: Open the journals and serve JSON-lines requests

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{handle_line, init, run, run_command, start, Request};
pub use errors::{CliError, CliResult};
pub use io::{error_response, ok_response};
