use clap::{Args, Subcommand};
use souq::{actors::Role, regions::Region};
use souq_app::domain::users::{
    PgUsersService, UsersService,
    data::{NewAddress, NewUser},
    records::{AddressUuid, UserUuid},
};

#[derive(Debug, Args)]
pub(crate) struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Debug, Subcommand)]
enum UsersSubcommand {
    /// Register a user, optionally with a first address
    Create(CreateUserArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CreateUserArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// customer, supplier, delivery_person or admin
    #[arg(long)]
    role: Role,

    /// Serviced region; required for delivery personnel
    #[arg(long)]
    region: Option<String>,

    /// Region of the user's first address
    #[arg(long, requires = "address_line")]
    address_region: Option<String>,

    /// Street address of the user's first address
    #[arg(long, requires = "address_region")]
    address_line: Option<String>,
}

pub(crate) async fn run(command: UsersCommand) -> Result<(), String> {
    match command.command {
        UsersSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateUserArgs) -> Result<(), String> {
    let service = PgUsersService::new(super::connect(&args.database_url).await?);

    let user = service
        .create_user(NewUser {
            uuid: UserUuid::new(),
            name: args.name,
            role: args.role,
            region: args.region.map(Region::new),
        })
        .await
        .map_err(|error| format!("failed to create user: {error}"))?;

    println!("user_uuid: {}", user.uuid);
    println!("role: {}", user.role);

    if let (Some(region), Some(line)) = (args.address_region, args.address_line) {
        let address = service
            .create_address(NewAddress {
                uuid: AddressUuid::new(),
                user_uuid: user.uuid,
                region: Region::new(region),
                line,
            })
            .await
            .map_err(|error| format!("failed to create address: {error}"))?;

        println!("address_uuid: {}", address.uuid);
    }

    Ok(())
}
