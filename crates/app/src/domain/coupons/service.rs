//! Coupons service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use souq::{
    actors::{Actor, Role},
    coupons::Coupon,
};

use crate::{
    database::Db,
    domain::{
        coupons::{
            data::NewCoupon, errors::CouponsServiceError, repository::PgCouponsRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    repository: PgCouponsRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCouponsRepository::new(),
        }
    }
}

fn ensure_issues(actor: &Actor, supplier: UserUuid) -> Result<(), CouponsServiceError> {
    let issuer = actor.role == Role::Supplier && actor.user == supplier.into_uuid();

    if issuer || actor.is_admin() {
        Ok(())
    } else {
        Err(CouponsServiceError::Forbidden)
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, actor, coupon),
        fields(code = %coupon.code, supplier_uuid = %coupon.supplier_uuid),
        err
    )]
    async fn create_coupon(
        &self,
        actor: &Actor,
        coupon: NewCoupon,
    ) -> Result<Coupon, CouponsServiceError> {
        ensure_issues(actor, coupon.supplier_uuid)?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_coupon(&mut tx, &coupon).await?;

        tx.commit().await?;

        info!(code = %created.code, "created coupon");

        Ok(created)
    }

    async fn get_coupon(&self, code: &str) -> Result<Coupon, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self.repository.get_coupon(&mut tx, code).await?;

        tx.commit().await?;

        Ok(coupon)
    }

    #[tracing::instrument(
        name = "coupons.service.set_active",
        skip(self, actor),
        fields(code = %code, active),
        err
    )]
    async fn set_active(
        &self,
        actor: &Actor,
        code: &str,
        active: bool,
    ) -> Result<Coupon, CouponsServiceError> {
        let mut tx = self.db.begin().await?;

        let coupon = self.repository.lock_coupon(&mut tx, code).await?;

        ensure_issues(actor, UserUuid::from_uuid(coupon.supplier))?;

        let updated = self.repository.set_active(&mut tx, code, active).await?;

        tx.commit().await?;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Issue a coupon for a supplier's goods.
    async fn create_coupon(
        &self,
        actor: &Actor,
        coupon: NewCoupon,
    ) -> Result<Coupon, CouponsServiceError>;

    /// Look up a coupon by its code.
    async fn get_coupon(&self, code: &str) -> Result<Coupon, CouponsServiceError>;

    /// Activate or deactivate a coupon.
    async fn set_active(
        &self,
        actor: &Actor,
        code: &str,
        active: bool,
    ) -> Result<Coupon, CouponsServiceError>;
}
