use clap::{Args, Subcommand, ValueEnum};
use reel_app::auth::Scope;

mod issue;
mod revoke;

#[derive(Debug, Args)]
pub(crate) struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokenSubcommand {
    Issue(issue::IssueTokenArgs),
    Revoke(revoke::RevokeTokenArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    Activation,
    Authentication,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Activation => Self::Activation,
            ScopeArg::Authentication => Self::Authentication,
        }
    }
}

pub(crate) async fn run(command: TokenCommand) -> Result<(), String> {
    match command.command {
        TokenSubcommand::Issue(args) => issue::run(args).await,
        TokenSubcommand::Revoke(args) => revoke::run(args).await,
    }
}
