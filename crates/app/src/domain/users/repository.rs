//! Users Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use souq::regions::Region;

use crate::{
    database::{try_get_parsed, try_get_timestamp},
    domain::users::{
        data::{NewAddress, NewUser},
        records::{AddressRecord, AddressUuid, UserRecord, UserUuid},
    },
};

const CREATE_USER_SQL: &str = include_str!("sql/create_user.sql");
const GET_USER_SQL: &str = include_str!("sql/get_user.sql");
const LOCK_USER_SQL: &str = include_str!("sql/lock_user.sql");
const CREATE_ADDRESS_SQL: &str = include_str!("sql/create_address.sql");
const GET_ADDRESS_SQL: &str = include_str!("sql/get_address.sql");
const GET_PRIMARY_ADDRESS_SQL: &str = include_str!("sql/get_primary_address.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &NewUser,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(CREATE_USER_SQL)
            .bind(user.uuid.into_uuid())
            .bind(&user.name)
            .bind(user.role.to_str())
            .bind(user.region.as_ref().map(Region::as_str))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(GET_USER_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock the user row for the rest of the transaction.
    ///
    /// Every balance check and adjustment happens behind this lock.
    pub(crate) async fn lock_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(LOCK_USER_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        address: &NewAddress,
    ) -> Result<AddressRecord, sqlx::Error> {
        query_as::<Postgres, AddressRecord>(CREATE_ADDRESS_SQL)
            .bind(address.uuid.into_uuid())
            .bind(address.user_uuid.into_uuid())
            .bind(address.region.as_str())
            .bind(&address.line)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        address: AddressUuid,
    ) -> Result<AddressRecord, sqlx::Error> {
        query_as::<Postgres, AddressRecord>(GET_ADDRESS_SQL)
            .bind(address.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// The user's oldest address, used as their pickup or drop-off point.
    pub(crate) async fn get_primary_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<AddressRecord>, sqlx::Error> {
        query_as::<Postgres, AddressRecord>(GET_PRIMARY_ADDRESS_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            role: try_get_parsed(row, "role")?,
            region: row.try_get::<Option<String>, _>("region")?.map(Region::from),
            balance: row.try_get("balance")?,
            created_at: try_get_timestamp(row, "created_at")?,
            updated_at: try_get_timestamp(row, "updated_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AddressRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AddressUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            region: Region::from(row.try_get::<String, _>("region")?),
            line: row.try_get("line")?,
            created_at: try_get_timestamp(row, "created_at")?,
        })
    }
}
