//! Tradeboard Application
//!
//! Headless command-line shell over a file-backed canvas store: manage
//! canvases, replay recorded input into them and export renders.

mod cli;
mod commands;

pub use cli::{Cli, Command};
pub use commands::run;
