use clap::Args;
use souq_app::auth::{AuthService, PgAuthService};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct RevokeTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Token to revoke
    #[arg(long)]
    token: Uuid,
}

pub(crate) async fn run(args: RevokeTokenArgs) -> Result<(), String> {
    let service = PgAuthService::new(crate::cli::connect(&args.database_url).await?);

    let revoked = service
        .revoke_token(args.token)
        .await
        .map_err(|error| format!("failed to revoke token: {error}"))?;

    if revoked {
        println!("token {} revoked", args.token);
    } else {
        println!("token {} was already revoked or does not exist", args.token);
    }

    Ok(())
}
