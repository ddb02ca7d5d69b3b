use clap::Args;
use souq_app::auth::{AuthService, PgAuthService};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct IssueTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User the token authenticates as
    #[arg(long)]
    user: Uuid,
}

pub(crate) async fn run(args: IssueTokenArgs) -> Result<(), String> {
    let service = PgAuthService::new(crate::cli::connect(&args.database_url).await?);

    let issued = service
        .issue_token(args.user.into())
        .await
        .map_err(|error| format!("failed to issue token: {error}"))?;

    println!("token_uuid: {}", issued.record.uuid);
    println!("user_uuid: {}", issued.record.user_uuid);
    println!("api_token: {}", issued.token);
    println!("store this token now; it is only shown once");

    Ok(())
}
