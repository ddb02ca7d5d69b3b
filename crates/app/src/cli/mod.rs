use clap::{Parser, Subcommand};
use souq_app::database::{self, Db};

mod db;
mod payments;
mod regions;
mod tokens;
mod users;

#[derive(Debug, Parser)]
#[command(name = "souq-app", about = "Souq CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Regions(regions::RegionsCommand),
    Users(users::UsersCommand),
    Tokens(tokens::TokensCommand),
    Payments(payments::PaymentsCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Regions(command) => regions::run(command).await,
            Commands::Users(command) => users::run(command).await,
            Commands::Tokens(command) => tokens::run(command).await,
            Commands::Payments(command) => payments::run(command).await,
        }
    }
}

async fn connect(database_url: &str) -> Result<Db, String> {
    database::connect(database_url)
        .await
        .map(Db::new)
        .map_err(|error| format!("failed to connect to database: {error}"))
}
