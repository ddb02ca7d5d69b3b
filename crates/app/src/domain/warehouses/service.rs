//! Warehouses service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use souq::regions::{Region, Warehouse, WarehouseDirectory};

use crate::{
    database::Db,
    domain::warehouses::{errors::WarehousesServiceError, repository::PgWarehousesRepository},
};

#[derive(Debug, Clone)]
pub struct PgWarehousesService {
    db: Db,
    repository: PgWarehousesRepository,
}

impl PgWarehousesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgWarehousesRepository::new(),
        }
    }
}

#[async_trait]
impl WarehousesService for PgWarehousesService {
    #[tracing::instrument(
        name = "warehouses.service.seed",
        skip(self, warehouses),
        fields(count = warehouses.len()),
        err
    )]
    async fn seed(&self, warehouses: Vec<Warehouse>) -> Result<usize, WarehousesServiceError> {
        WarehouseDirectory::new(warehouses.iter().cloned())?;

        let mut tx = self.db.begin().await?;

        for warehouse in &warehouses {
            self.repository.upsert_warehouse(&mut tx, warehouse).await?;
        }

        tx.commit().await?;

        info!(count = warehouses.len(), "seeded regional warehouses");

        Ok(warehouses.len())
    }

    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, WarehousesServiceError> {
        let mut tx = self.db.begin().await?;

        let warehouses = self.repository.list_warehouses(&mut tx).await?;

        tx.commit().await?;

        Ok(warehouses)
    }

    async fn get_warehouse(&self, region: &Region) -> Result<Warehouse, WarehousesServiceError> {
        let mut tx = self.db.begin().await?;

        let warehouse = self.repository.get_warehouse(&mut tx, region).await?;

        tx.commit().await?;

        Ok(warehouse)
    }

    async fn directory(&self) -> Result<WarehouseDirectory, WarehousesServiceError> {
        let warehouses = self.list_warehouses().await?;

        Ok(WarehouseDirectory::new(warehouses)?)
    }
}

#[automock]
#[async_trait]
pub trait WarehousesService: Send + Sync {
    /// Insert or update regional warehouses, returning how many were written.
    async fn seed(&self, warehouses: Vec<Warehouse>) -> Result<usize, WarehousesServiceError>;

    /// All warehouses ordered by region.
    async fn list_warehouses(&self) -> Result<Vec<Warehouse>, WarehousesServiceError>;

    /// The warehouse serving a region.
    async fn get_warehouse(&self, region: &Region) -> Result<Warehouse, WarehousesServiceError>;

    /// Snapshot of every warehouse as a lookup directory.
    async fn directory(&self) -> Result<WarehouseDirectory, WarehousesServiceError>;
}
