use std::sync::Arc;

use clap::{Args, Subcommand};
use jiff::Timestamp;
use souq_app::{
    domain::payments::{PaymentsService, PgPaymentsService},
    notifications::{DEFAULT_CAPACITY, LogNotifier, NotificationQueue},
    settings::{PaymentsConfig, SettlementConfig},
};

#[derive(Debug, Args)]
pub(crate) struct PaymentsCommand {
    #[command(subcommand)]
    command: PaymentsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PaymentsSubcommand {
    /// Expire stale pending card payments
    Sweep(SweepArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SweepArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(flatten)]
    settlement: SettlementConfig,

    #[command(flatten)]
    payments: PaymentsConfig,
}

pub(crate) async fn run(command: PaymentsCommand) -> Result<(), String> {
    match command.command {
        PaymentsSubcommand::Sweep(args) => sweep(args).await,
    }
}

async fn sweep(args: SweepArgs) -> Result<(), String> {
    let db = super::connect(&args.database_url).await?;

    let service = PgPaymentsService::new(
        db,
        &args.settlement.settings(),
        &args.payments.settings(),
        NotificationQueue::spawn(Arc::new(LogNotifier), DEFAULT_CAPACITY),
    );

    let report = service
        .sweep(Timestamp::now())
        .await
        .map_err(|error| format!("failed to sweep payments: {error}"))?;

    println!("payments_expired: {}", report.payments_expired);

    Ok(())
}
