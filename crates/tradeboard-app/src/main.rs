//! Main application entry point.

use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::debug!("Starting Tradeboard");

    let cli = tradeboard_app::Cli::parse();
    let stdout = std::io::stdout();
    pollster::block_on(tradeboard_app::run(cli, &mut stdout.lock()))
}
