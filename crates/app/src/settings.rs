//! Runtime settings shared by the services.

use clap::Args;
use jiff::SignedDuration;
use uuid::Uuid;

use souq::{
    ledger::SettlementPolicy,
    money::{Amount, percent_points},
    pricing::FeeSchedule,
};

/// Settlement configuration.
#[derive(Debug, Clone)]
pub struct SettlementSettings {
    /// Platform ledger account used as counterparty for purchases, refunds and fee cuts.
    pub house_account: Uuid,

    /// Withdrawals above this amount wait for manual review.
    pub withdrawal_review_threshold: Amount,

    pub fees: FeeSchedule,

    /// ISO code used when amounts are shown to users.
    pub currency: String,
}

impl SettlementSettings {
    #[must_use]
    pub fn policy(&self) -> SettlementPolicy {
        SettlementPolicy::new(self.house_account, self.fees)
    }
}

/// Checkout configuration.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    /// How long a quote stays cached.
    pub quote_ttl: SignedDuration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            quote_ttl: SignedDuration::from_mins(15),
        }
    }
}

/// Card payment configuration.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Shared secret the gateway signs webhook bodies with.
    pub webhook_secret: String,

    /// Pending payments older than this are expired.
    pub horizon: SignedDuration,
}

impl PaymentSettings {
    #[must_use]
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            horizon: SignedDuration::from_hours(24),
        }
    }
}

/// Everything needed to build the application context.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub database_url: String,
    pub settlement: SettlementSettings,
    pub checkout: CheckoutSettings,
    pub payments: PaymentSettings,

    /// Notification endpoint; notifications are only logged when unset.
    pub notifications_url: Option<String>,
}

/// Settlement flags shared by the CLI and the server.
#[derive(Debug, Clone, Args)]
pub struct SettlementConfig {
    /// Admin user whose ledger account is the platform's
    #[arg(long, env = "SOUQ_HOUSE_ACCOUNT")]
    pub house_account: Uuid,

    /// Currency code amounts are shown in
    #[arg(long, env = "SOUQ_CURRENCY", default_value = "EGP")]
    pub currency: String,

    /// Withdrawals above this amount (minor units) need admin approval
    #[arg(long, env = "SOUQ_WITHDRAWAL_REVIEW_THRESHOLD", default_value_t = 500_000)]
    pub withdrawal_review_threshold: Amount,

    /// Delivery surcharge for goods crossing regions (minor units)
    #[arg(long, env = "SOUQ_CROSS_REGION_SURCHARGE", default_value_t = 2_000)]
    pub cross_region_surcharge: Amount,

    /// Cashback credited at order creation, in percent
    #[arg(long, env = "SOUQ_CASHBACK_PERCENT", default_value_t = 5)]
    pub cashback_percent: u16,

    /// Platform share of each delivery fee, in percent
    #[arg(long, env = "SOUQ_PLATFORM_CUT_PERCENT", default_value_t = 15)]
    pub platform_cut_percent: u16,
}

impl SettlementConfig {
    #[must_use]
    pub fn settings(&self) -> SettlementSettings {
        SettlementSettings {
            house_account: self.house_account,
            withdrawal_review_threshold: self.withdrawal_review_threshold,
            fees: FeeSchedule {
                cross_region_surcharge: self.cross_region_surcharge,
                cashback: percent_points(self.cashback_percent),
                platform_cut: percent_points(self.platform_cut_percent),
            },
            currency: self.currency.clone(),
        }
    }
}

/// Card payment flags.
#[derive(Debug, Clone, Args)]
pub struct PaymentsConfig {
    /// Shared secret for webhook signatures
    #[arg(long, env = "SOUQ_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// Hours a card payment may stay pending before it is expired
    #[arg(long, env = "SOUQ_PAYMENT_HORIZON_HOURS", default_value_t = 24)]
    pub payment_horizon_hours: i64,
}

impl PaymentsConfig {
    #[must_use]
    pub fn settings(&self) -> PaymentSettings {
        PaymentSettings {
            webhook_secret: self.webhook_secret.clone(),
            horizon: SignedDuration::from_hours(self.payment_horizon_hours),
        }
    }
}
