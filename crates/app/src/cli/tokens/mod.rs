use clap::{Args, Subcommand};

mod issue;
mod list;
mod revoke;

#[derive(Debug, Args)]
pub(crate) struct TokensCommand {
    #[command(subcommand)]
    command: TokensSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokensSubcommand {
    Issue(issue::IssueTokenArgs),
    List(list::ListTokensArgs),
    Revoke(revoke::RevokeTokenArgs),
}

pub(crate) async fn run(command: TokensCommand) -> Result<(), String> {
    match command.command {
        TokensSubcommand::Issue(args) => issue::run(args).await,
        TokensSubcommand::List(args) => list::run(args).await,
        TokensSubcommand::Revoke(args) => revoke::run(args).await,
    }
}
