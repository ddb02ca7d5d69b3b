//! Products service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use souq::actors::{Actor, Role};

use crate::{
    database::Db,
    domain::{
        products::{
            data::{NewProduct, ProductUpdate},
            errors::ProductsServiceError,
            records::{ProductRecord, ProductUuid},
            repository::PgProductsRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

fn ensure_manages(actor: &Actor, supplier: UserUuid) -> Result<(), ProductsServiceError> {
    let owns = actor.role == Role::Supplier && actor.user == supplier.into_uuid();

    if owns || actor.is_admin() {
        Ok(())
    } else {
        Err(ProductsServiceError::Forbidden)
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, actor, product),
        fields(product_uuid = %product.uuid, supplier_uuid = %product.supplier_uuid),
        err
    )]
    async fn create_product(
        &self,
        actor: &Actor,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        ensure_manages(actor, product.supplier_uuid)?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_product(&mut tx, &product).await?;

        tx.commit().await?;

        info!(product_uuid = %created.uuid, "created product");

        Ok(created)
    }

    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(product)
    }

    async fn list_supplier_products(
        &self,
        supplier: UserUuid,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let products = self
            .repository
            .list_supplier_products(&mut tx, supplier)
            .await?;

        tx.commit().await?;

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.service.update_product",
        skip(self, actor, update),
        fields(product_uuid = %product),
        err
    )]
    async fn update_product(
        &self,
        actor: &Actor,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin().await?;

        let existing = self.repository.get_product(&mut tx, product).await?;

        ensure_manages(actor, existing.supplier_uuid)?;

        let updated = self
            .repository
            .update_product(&mut tx, product, &update)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// List a product for sale under a supplier.
    async fn create_product(
        &self,
        actor: &Actor,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, ProductsServiceError>;

    /// Every product a supplier sells.
    async fn list_supplier_products(
        &self,
        supplier: UserUuid,
    ) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Change a product's price and stock level.
    async fn update_product(
        &self,
        actor: &Actor,
        product: ProductUuid,
        update: ProductUpdate,
    ) -> Result<ProductRecord, ProductsServiceError>;
}
