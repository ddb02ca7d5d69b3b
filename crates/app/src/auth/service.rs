//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, debug};
use uuid::Uuid;

use souq::actors::Actor;

use crate::{
    auth::{
        ApiTokenRecord, AuthServiceError, IssuedApiToken, generate_api_token, hash_api_token,
        models::NewApiToken, parse_api_token, repository::PgAuthRepository,
    },
    database::Db,
    domain::users::records::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    db: Db,
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAuthRepository::new(),
        }
    }

    async fn touch(&self, token: Uuid) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        self.repository.touch_last_used(&mut tx, token).await?;

        tx.commit().await
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Actor, AuthServiceError> {
        parse_api_token(bearer_token).map_err(|_| AuthServiceError::NotFound)?;

        let mut tx = self.db.begin().await?;

        let found = self
            .repository
            .find_actor_by_token_hash(&mut tx, &hash_api_token(bearer_token))
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        tx.commit().await?;

        // Best effort; authentication does not depend on this write.
        if let Err(error) = self.touch(found.token_uuid).await {
            debug!(error = %error, "failed to record token use");
        }

        Ok(found.actor)
    }

    #[tracing::instrument(
        name = "auth.service.issue_token",
        skip(self),
        fields(user_uuid = %user, token_uuid = tracing::field::Empty),
        err
    )]
    async fn issue_token(&self, user: UserUuid) -> Result<IssuedApiToken, AuthServiceError> {
        let generated = generate_api_token();

        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .create_api_token(
                &mut tx,
                &NewApiToken {
                    uuid: generated.uuid,
                    user_uuid: user,
                    token_hash: hash_api_token(&generated.token),
                },
            )
            .await?;

        tx.commit().await?;

        Span::current().record("token_uuid", tracing::field::display(record.uuid));

        Ok(IssuedApiToken {
            token: generated.token,
            record,
        })
    }

    async fn list_tokens(&self, user: UserUuid) -> Result<Vec<ApiTokenRecord>, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let tokens = self
            .repository
            .list_user_tokens(&mut tx, user.into_uuid())
            .await?;

        tx.commit().await?;

        Ok(tokens)
    }

    #[tracing::instrument(name = "auth.service.revoke_token", skip(self), err)]
    async fn revoke_token(&self, token: Uuid) -> Result<bool, AuthServiceError> {
        let mut tx = self.db.begin().await?;

        let revoked = self.repository.revoke_api_token(&mut tx, token).await?;

        tx.commit().await?;

        Ok(revoked.is_some())
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the user acting with it.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Actor, AuthServiceError>;

    /// Issue a new API token for a user. The raw token is only returned here.
    async fn issue_token(&self, user: UserUuid) -> Result<IssuedApiToken, AuthServiceError>;

    /// Every token a user holds, newest first.
    async fn list_tokens(&self, user: UserUuid) -> Result<Vec<ApiTokenRecord>, AuthServiceError>;

    /// Revoke a token. Returns `true` if it was active.
    async fn revoke_token(&self, token: Uuid) -> Result<bool, AuthServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use souq::{actors::Role, regions::Region};

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn issued_tokens_authenticate_as_their_user() -> TestResult {
        let ctx = TestContext::new().await;
        let courier = ctx.courier("Giza").await?;

        let issued = ctx.auth.issue_token(courier.user.into()).await?;
        let actor = ctx.auth.authenticate_bearer(&issued.token).await?;

        assert_eq!(actor.user, courier.user);
        assert_eq!(actor.role, Role::DeliveryPerson);
        assert_eq!(actor.region, Some(Region::new("giza")));

        let tokens = ctx.auth.list_tokens(courier.user.into()).await?;

        assert!(
            tokens.first().is_some_and(|t| t.last_used_at.is_some()),
            "use should be recorded"
        );

        Ok(())
    }

    #[tokio::test]
    async fn revoked_tokens_stop_working() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = ctx.customer().await?;
        let issued = ctx.auth.issue_token(customer).await?;

        assert!(ctx.auth.revoke_token(issued.record.uuid).await?);
        assert!(!ctx.auth.revoke_token(issued.record.uuid).await?);

        let result = ctx.auth.authenticate_bearer(&issued.token).await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_and_unknown_tokens_are_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let stranger = generate_api_token();

        for token in ["", "Bearer nope", stranger.token.as_str()] {
            let result = ctx.auth.authenticate_bearer(token).await;

            assert!(
                matches!(result, Err(AuthServiceError::NotFound)),
                "expected NotFound for {token:?}, got {result:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn tokens_need_an_existing_user() {
        let ctx = TestContext::new().await;

        let result = ctx.auth.issue_token(UserUuid::new()).await;

        assert!(
            matches!(result, Err(AuthServiceError::UnknownUser)),
            "expected UnknownUser, got {result:?}"
        );
    }
}
