//! Auth repository.

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use souq::{
    actors::{Actor, Role},
    regions::Region,
};

use crate::{
    auth::models::{ApiTokenRecord, NewApiToken},
    database::{try_get_parsed, try_get_timestamp},
};

const CREATE_API_TOKEN_SQL: &str = include_str!("sql/create_api_token.sql");
const FIND_ACTOR_BY_TOKEN_HASH_SQL: &str = include_str!("sql/find_actor_by_token_hash.sql");
const TOUCH_API_TOKEN_SQL: &str = include_str!("sql/touch_api_token.sql");
const REVOKE_API_TOKEN_SQL: &str = include_str!("sql/revoke_api_token.sql");
const LIST_USER_TOKENS_SQL: &str = include_str!("sql/list_user_tokens.sql");

/// Token row resolved to the user it authenticates.
#[derive(Debug, Clone)]
pub(crate) struct TokenActor {
    pub token_uuid: Uuid,
    pub actor: Actor,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAuthRepository;

impl PgAuthRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_api_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &NewApiToken,
    ) -> Result<ApiTokenRecord, sqlx::Error> {
        query_as::<Postgres, ApiTokenRecord>(CREATE_API_TOKEN_SQL)
            .bind(token.uuid)
            .bind(token.user_uuid.into_uuid())
            .bind(&token.token_hash)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_actor_by_token_hash(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        hash: &str,
    ) -> Result<Option<TokenActor>, sqlx::Error> {
        query_as::<Postgres, TokenActor>(FIND_ACTOR_BY_TOKEN_HASH_SQL)
            .bind(hash)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn touch_last_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: Uuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_API_TOKEN_SQL)
            .bind(token)
            .execute(&mut **tx)
            .await
            .map(|_| ())
    }

    pub(crate) async fn revoke_api_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: Uuid,
    ) -> Result<Option<ApiTokenRecord>, sqlx::Error> {
        query_as::<Postgres, ApiTokenRecord>(REVOKE_API_TOKEN_SQL)
            .bind(token)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_user_tokens(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: Uuid,
    ) -> Result<Vec<ApiTokenRecord>, sqlx::Error> {
        query_as::<Postgres, ApiTokenRecord>(LIST_USER_TOKENS_SQL)
            .bind(user)
            .fetch_all(&mut **tx)
            .await
    }
}

fn try_get_optional_timestamp(
    row: &PgRow,
    col: &str,
) -> Result<Option<jiff::Timestamp>, sqlx::Error> {
    Ok(row
        .try_get::<Option<SqlxTimestamp>, _>(col)?
        .map(SqlxTimestamp::to_jiff))
}

impl<'r> FromRow<'r, PgRow> for ApiTokenRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            user_uuid: row.try_get::<Uuid, _>("user_uuid")?.into(),
            created_at: try_get_timestamp(row, "created_at")?,
            last_used_at: try_get_optional_timestamp(row, "last_used_at")?,
            revoked_at: try_get_optional_timestamp(row, "revoked_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TokenActor {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let role: Role = try_get_parsed(row, "role")?;
        let region = row.try_get::<Option<String>, _>("region")?.map(Region::new);

        Ok(Self {
            token_uuid: row.try_get("token_uuid")?,
            actor: Actor::new(row.try_get("uuid")?, role, region),
        })
    }
}
