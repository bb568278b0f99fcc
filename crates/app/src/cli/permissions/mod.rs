use clap::{Args, Subcommand};

mod grant;

#[derive(Debug, Args)]
pub(crate) struct PermissionsCommand {
    #[command(subcommand)]
    command: PermissionsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PermissionsSubcommand {
    Grant(grant::GrantPermissionsArgs),
}

pub(crate) async fn run(command: PermissionsCommand) -> Result<(), String> {
    match command.command {
        PermissionsSubcommand::Grant(args) => grant::run(args).await,
    }
}
