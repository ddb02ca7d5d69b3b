use std::{fs, path::PathBuf};

use clap::{Args, Subcommand};
use souq::regions::parse_seed;
use souq_app::domain::warehouses::{PgWarehousesService, WarehousesService};

#[derive(Debug, Args)]
pub(crate) struct RegionsCommand {
    #[command(subcommand)]
    command: RegionsSubcommand,
}

#[derive(Debug, Subcommand)]
enum RegionsSubcommand {
    /// Insert or update regional warehouses from a YAML seed file
    Seed(SeedArgs),

    /// Print every seeded warehouse
    List(ListArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SeedArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// YAML file with a top-level `regions` list
    #[arg(long)]
    file: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(command: RegionsCommand) -> Result<(), String> {
    match command.command {
        RegionsSubcommand::Seed(args) => seed(args).await,
        RegionsSubcommand::List(args) => list(args).await,
    }
}

async fn seed(args: SeedArgs) -> Result<(), String> {
    let yaml = fs::read_to_string(&args.file)
        .map_err(|error| format!("failed to read {}: {error}", args.file.display()))?;

    let warehouses = parse_seed(&yaml).map_err(|error| format!("invalid seed file: {error}"))?;

    let service = PgWarehousesService::new(super::connect(&args.database_url).await?);

    let written = service
        .seed(warehouses)
        .await
        .map_err(|error| format!("failed to seed warehouses: {error}"))?;

    println!("warehouses written: {written}");

    Ok(())
}

async fn list(args: ListArgs) -> Result<(), String> {
    let service = PgWarehousesService::new(super::connect(&args.database_url).await?);

    let warehouses = service
        .list_warehouses()
        .await
        .map_err(|error| format!("failed to list warehouses: {error}"))?;

    for warehouse in warehouses {
        println!(
            "{}\t{}\t{}",
            warehouse.region, warehouse.flat_fee, warehouse.address
        );
    }

    Ok(())
}
