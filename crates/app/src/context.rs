//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, PgCheckoutService},
        coupons::{CouponsService, PgCouponsService},
        ledger::{LedgerService, PgLedgerService},
        orders::{OrdersService, PgOrdersService},
        payments::{PaymentsService, PgPaymentsService},
        products::{PgProductsService, ProductsService},
        returns::{PgReturnsService, ReturnsService},
        shipments::{PgShipmentsService, ShipmentsService},
        users::{PgUsersService, UsersService},
        warehouses::{PgWarehousesService, WarehousesService},
        withdrawals::{PgWithdrawalsService, WithdrawalsService},
    },
    notifications::{DEFAULT_CAPACITY, HttpNotifier, LogNotifier, NotificationQueue, Notifier},
    settings::AppSettings,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UsersService>,
    pub warehouses: Arc<dyn WarehousesService>,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub coupons: Arc<dyn CouponsService>,
    pub ledger: Arc<dyn LedgerService>,
    pub orders: Arc<dyn OrdersService>,
    pub shipments: Arc<dyn ShipmentsService>,
    pub returns: Arc<dyn ReturnsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub payments: Arc<dyn PaymentsService>,
    pub withdrawals: Arc<dyn WithdrawalsService>,
}

impl AppContext {
    /// Build the application context, applying pending migrations first.
    ///
    /// Must be called from within a Tokio runtime; the notification worker is spawned here.
    ///
    /// # Errors
    ///
    /// Returns an error when connecting to or migrating the database fails.
    pub async fn from_settings(settings: &AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect(&settings.database_url)
            .await
            .map_err(AppInitError::Database)?;

        database::migrate(&pool)
            .await
            .map_err(AppInitError::Migrate)?;

        let notifier: Arc<dyn Notifier> = match &settings.notifications_url {
            Some(url) => Arc::new(HttpNotifier::new(url.clone())),
            None => Arc::new(LogNotifier),
        };

        Ok(Self::new(
            &Db::new(pool),
            settings,
            NotificationQueue::spawn(notifier, DEFAULT_CAPACITY),
        ))
    }

    #[must_use]
    pub fn new(db: &Db, settings: &AppSettings, notifications: NotificationQueue) -> Self {
        let settlement = &settings.settlement;

        Self {
            auth: Arc::new(PgAuthService::new(db.clone())),
            users: Arc::new(PgUsersService::new(db.clone())),
            warehouses: Arc::new(PgWarehousesService::new(db.clone())),
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            coupons: Arc::new(PgCouponsService::new(db.clone())),
            ledger: Arc::new(PgLedgerService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(
                db.clone(),
                settlement,
                notifications.clone(),
            )),
            shipments: Arc::new(PgShipmentsService::new(
                db.clone(),
                settlement,
                notifications.clone(),
            )),
            returns: Arc::new(PgReturnsService::new(
                db.clone(),
                settlement,
                notifications.clone(),
            )),
            checkout: Arc::new(PgCheckoutService::new(
                db.clone(),
                settlement,
                settings.checkout,
                notifications.clone(),
            )),
            payments: Arc::new(PgPaymentsService::new(
                db.clone(),
                settlement,
                &settings.payments,
                notifications.clone(),
            )),
            withdrawals: Arc::new(PgWithdrawalsService::new(
                db.clone(),
                settlement,
                notifications,
            )),
        }
    }
}
