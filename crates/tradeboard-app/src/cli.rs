//! Command line interface for the Tradeboard shell.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tradeboard CLI arguments
///
/// Examples:
///   tradeboard list                                  # List saved canvases
///   tradeboard new --name "EURUSD breakout"          # Create an empty canvas
///   tradeboard replay session.json --name Review     # Replay recorded input into a new canvas
///   tradeboard render <ID> chart.png --fit           # Export a canvas to PNG
#[derive(Parser, Debug)]
#[command(
    name = "tradeboard",
    version,
    about = "Headless shell for the Tradeboard annotation engine"
)]
pub struct Cli {
    /// Canvas store directory (defaults to the platform data directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Preferences file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List saved canvases, most recently updated first
    List,
    /// Create an empty canvas
    New {
        #[arg(long)]
        name: Option<String>,
    },
    /// Print a canvas summary
    Show {
        id: String,
        /// Print the full JSON document instead
        #[arg(long)]
        json: bool,
    },
    /// Delete a canvas
    Delete { id: String },
    /// Apply a JSON array of input events and save the result with a thumbnail
    Replay {
        /// Event script
        script: PathBuf,
        /// Existing canvas to continue instead of creating a new one
        #[arg(long, value_name = "ID")]
        canvas: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
    /// Render a canvas to PNG
    Render {
        id: String,
        output: PathBuf,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
        /// Fit the view to the content instead of the saved transform
        #[arg(long)]
        fit: bool,
    },
    /// Print the active keyboard shortcuts
    Shortcuts,
    /// Write the current preferences (defaults if none exist) to the preferences file
    InitConfig,
}
