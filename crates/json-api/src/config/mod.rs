//! Server configuration module

use clap::Parser;

use souq_app::settings::{AppSettings, PaymentsConfig, SettlementConfig};

use crate::config::{
    db::DatabaseConfig,
    marketplace::{CheckoutConfig, NotificationsConfig},
    observability::{LoggingConfig, ObservabilityConfig},
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod marketplace;
pub(crate) mod observability;
pub(crate) mod server;

/// Souq JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "souq-json", about = "Souq JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Request logging settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Fees, cashback and the house account.
    #[command(flatten)]
    pub settlement: SettlementConfig,

    /// Quote cache and stale payment sweep.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Card payment gateway settings.
    #[command(flatten)]
    pub payments: PaymentsConfig,

    /// Outbound notification delivery.
    #[command(flatten)]
    pub notifications: NotificationsConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings the application context is built from.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            database_url: self.database.database_url.clone(),
            settlement: self.settlement.settings(),
            checkout: self.checkout.settings(),
            payments: self.payments.settings(),
            notifications_url: self.notifications.notifications_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn flags_build_app_settings() -> TestResult {
        let house = Uuid::now_v7();

        let config = ServerConfig::try_parse_from([
            "souq-json",
            "--database-url",
            "postgres://localhost/souq",
            "--house-account",
            &house.to_string(),
            "--webhook-secret",
            "whsec",
            "--quote-cache-ttl-seconds",
            "60",
            "--port",
            "9000",
        ])?;

        let settings = config.app_settings();

        assert_eq!(config.socket_addr(), "0.0.0.0:9000");
        assert_eq!(settings.settlement.house_account, house);
        assert_eq!(settings.settlement.currency, "EGP");
        assert_eq!(settings.checkout.quote_ttl, SignedDuration::from_secs(60));
        assert_eq!(settings.payments.webhook_secret, "whsec");
        assert_eq!(settings.notifications_url, None);

        Ok(())
    }
}
