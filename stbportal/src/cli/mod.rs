use anyhow::Result;
use clap::{Parser, Subcommand};

mod parse_playlist;
mod register;
mod serve;

pub use parse_playlist::ParsePlaylistCommand;
pub use register::RegisterCommand;
pub use serve::ServeCommand;

#[derive(Parser, Debug)]
#[command(name = "stbportal")]
#[command(about = "Set-top box portal emulator serving an M3U playlist as a channel catalog")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the portal HTTP server (default)
    Serve(ServeCommand),
    /// Add a device to a registry file and exit
    Register(RegisterCommand),
    /// Fetch and parse a playlist, print the resulting catalog and exit
    ParsePlaylist(ParsePlaylistCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let command = self
            .command
            .unwrap_or_else(|| Command::Serve(ServeCommand::parse_from(["serve"])));

        match command {
            Command::Serve(cmd) => cmd.run().await,
            Command::Register(cmd) => cmd.run().await,
            Command::ParsePlaylist(cmd) => cmd.run().await,
        }
    }
}
