use clap::{Parser, Subcommand};

mod db;
mod permissions;
mod token;

#[derive(Debug, Parser)]
#[command(name = "reel-app", about = "Reel admin CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Permissions(permissions::PermissionsCommand),
    Token(token::TokenCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Permissions(command) => permissions::run(command).await,
            Commands::Token(command) => token::run(command).await,
        }
    }
}
