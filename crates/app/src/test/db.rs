//! Per-test databases inside one shared `PostgreSQL` container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

use crate::database;

const USER: &str = "souq_test";
const PASSWORD: &str = "souq_test_password";

/// Database names are interpolated into DDL, so only a conservative alphabet is accepted.
fn is_safe_database_name(name: &str) -> bool {
    let starts_well = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');

    starts_well
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("souq_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

static CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

static DROPPER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn start_dropper() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(error) = drop_database(&name).await {
                eprintln!("Failed to drop test database '{name}': {error}");
            }
        }
    });

    sender
}

async fn server_url(database: &str) -> Option<String> {
    let container = CONTAINER.get()?;
    let port = container.get_host_port_ipv4(5432).await.ok()?;
    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    Some(format!(
        "postgresql://{USER}:{PASSWORD}@{host}:{port}/{database}"
    ))
}

async fn drop_database(name: &str) -> Result<(), sqlx::Error> {
    if !is_safe_database_name(name) {
        return Ok(());
    }

    let Some(url) = server_url("postgres").await else {
        return Ok(());
    };

    let mut conn = PgConnection::connect(&url).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A freshly migrated database owned by one test.
///
/// Tests commit normally; isolation comes from every test getting its own database, which is
/// dropped in the background once the handle goes away.
#[derive(Debug)]
pub struct TestDb {
    pub pool: PgPool,
    pub name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = DROPPER.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        let name = format!("souq_{}", uuid::Uuid::now_v7().simple());

        Self::named(&name).await
    }

    pub async fn named(name: &str) -> Self {
        assert!(is_safe_database_name(name), "unsafe database name {name:?}");

        DROPPER.get_or_init(start_dropper).await;
        CONTAINER.get_or_init(start_container).await;

        let admin_url = server_url("postgres")
            .await
            .expect("Failed to resolve container address");

        let mut conn = PgConnection::connect(&admin_url)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let url = server_url(name)
            .await
            .expect("Failed to resolve container address");

        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to create pool for database");

        database::migrate(&pool)
            .await
            .expect("Failed to run migrations on database");

        Self {
            pool,
            name: name.to_string(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_safe() {
        let name = format!("souq_{}", uuid::Uuid::now_v7().simple());

        assert!(is_safe_database_name(&name));
    }

    #[test]
    fn unsafe_names_are_refused() {
        assert!(!is_safe_database_name(""));
        assert!(!is_safe_database_name("9lives"));
        assert!(!is_safe_database_name("drop\"table"));
        assert!(!is_safe_database_name("has-hyphen"));
        assert!(!is_safe_database_name(&"a".repeat(64)));
    }

    #[tokio::test]
    async fn migrations_create_the_schema() {
        let test_db = TestDb::new().await;

        let tables: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name IN ('orders', 'shipments', 'transactions')",
        )
        .fetch_one(test_db.pool())
        .await
        .expect("Failed to query information schema");

        assert_eq!(tables, 3);
    }
}
