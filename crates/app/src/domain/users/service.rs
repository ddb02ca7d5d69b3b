//! Users service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::users::{
        data::{NewAddress, NewUser},
        errors::UsersServiceError,
        records::{AddressRecord, AddressUuid, UserRecord, UserUuid},
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    #[tracing::instrument(
        name = "users.service.create_user",
        skip(self, user),
        fields(user_uuid = %user.uuid, role = %user.role),
        err
    )]
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_user(&mut tx, &user).await?;

        tx.commit().await?;

        info!(user_uuid = %created.uuid, "created user");

        Ok(created)
    }

    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let user = self.repository.get_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(user)
    }

    #[tracing::instrument(
        name = "users.service.create_address",
        skip(self, address),
        fields(user_uuid = %address.user_uuid, address_uuid = tracing::field::Empty),
        err
    )]
    async fn create_address(
        &self,
        address: NewAddress,
    ) -> Result<AddressRecord, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_address(&mut tx, &address).await?;

        tx.commit().await?;

        Span::current().record("address_uuid", created.uuid.to_string());

        Ok(created)
    }

    async fn get_address(&self, address: AddressUuid) -> Result<AddressRecord, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let address = self.repository.get_address(&mut tx, address).await?;

        tx.commit().await?;

        Ok(address)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Register a user with a role.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;

    /// Retrieve a single user, including their current balance.
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError>;

    /// Add a delivery address for a user.
    async fn create_address(&self, address: NewAddress)
    -> Result<AddressRecord, UsersServiceError>;

    /// Retrieve a single address.
    async fn get_address(&self, address: AddressUuid) -> Result<AddressRecord, UsersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use souq::{actors::Role, regions::Region};

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn create_user_starts_with_zero_balance() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = UserUuid::new();

        let user = ctx
            .users
            .create_user(NewUser {
                uuid,
                name: "Mona".to_string(),
                role: Role::Customer,
                region: None,
            })
            .await?;

        assert_eq!(user.uuid, uuid);
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.balance, 0);

        Ok(())
    }

    #[tokio::test]
    async fn delivery_person_without_region_is_invalid() {
        let ctx = TestContext::new().await;

        let result = ctx
            .users
            .create_user(NewUser {
                uuid: UserUuid::new(),
                name: "Karim".to_string(),
                role: Role::DeliveryPerson,
                region: None,
            })
            .await;

        assert!(
            matches!(result, Err(UsersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_address_normalises_region() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = ctx.customer().await?;

        let address = ctx
            .users
            .create_address(NewAddress {
                uuid: AddressUuid::new(),
                user_uuid: customer,
                region: Region::new(" Giza "),
                line: "7 Pyramids Rd".to_string(),
            })
            .await?;

        let fetched = ctx.users.get_address(address.uuid).await?;

        assert_eq!(fetched.region.as_str(), "giza");
        assert_eq!(fetched.user_uuid, customer);

        Ok(())
    }

    #[tokio::test]
    async fn address_for_unknown_user_is_invalid_reference() {
        let ctx = TestContext::new().await;

        let result = ctx
            .users
            .create_address(NewAddress {
                uuid: AddressUuid::new(),
                user_uuid: UserUuid::new(),
                region: Region::new("Cairo"),
                line: "1 Tahrir Sq".to_string(),
            })
            .await;

        assert!(
            matches!(result, Err(UsersServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );
    }

    #[tokio::test]
    async fn get_unknown_user_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.users.get_user(UserUuid::new()).await;

        assert!(
            matches!(result, Err(UsersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
