//! Checkout & Notification Config

use std::time::Duration;

use clap::Args;
use jiff::SignedDuration;

use souq_app::settings::CheckoutSettings;

/// Checkout settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// Seconds a priced cart stays cached
    #[arg(long, env = "SOUQ_QUOTE_CACHE_TTL_SECONDS", default_value_t = 900)]
    pub quote_cache_ttl_seconds: i64,

    /// Seconds between stale payment sweeps (0 disables the sweep)
    #[arg(long, env = "SOUQ_STALE_SWEEP_INTERVAL_SECONDS", default_value_t = 300)]
    pub stale_sweep_interval_seconds: u64,
}

impl CheckoutConfig {
    #[must_use]
    pub fn settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            quote_ttl: SignedDuration::from_secs(self.quote_cache_ttl_seconds),
        }
    }

    /// Sweep period, `None` when the sweep is disabled.
    #[must_use]
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.stale_sweep_interval_seconds > 0)
            .then(|| Duration::from_secs(self.stale_sweep_interval_seconds))
    }
}

/// Notification settings.
#[derive(Debug, Args)]
pub struct NotificationsConfig {
    /// Endpoint notifications are POSTed to; they are only logged when unset
    #[arg(long, env = "SOUQ_NOTIFICATIONS_URL")]
    pub notifications_url: Option<String>,
}
