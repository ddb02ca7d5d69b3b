//! Carts service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            records::{CartItemRecord, CartItemUuid, CartRecord},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut cart = self.carts_repository.ensure_cart(&mut tx, user).await?;

        let items = self.items_repository.get_cart_items(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        cart.items.extend(items);

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(user_uuid = %user, product_uuid = %item.product_uuid),
        err
    )]
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;

        let item = self
            .items_repository
            .create_cart_item(&mut tx, cart.uuid, &item)
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    async fn remove_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts_repository.ensure_cart(&mut tx, user).await?;

        let rows_affected = self
            .items_repository
            .delete_cart_item(&mut tx, cart.uuid, item)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The user's cart with its items; an empty cart is opened on first use.
    async fn get_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError>;

    /// Add a product to the user's cart.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Remove an item from the user's cart.
    async fn remove_item(&self, user: UserUuid, item: CartItemUuid)
    -> Result<(), CartsServiceError>;
}
