//! Quote Cache

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use souq::pricing::Quote;

use crate::domain::{carts::records::CartUuid, users::records::AddressUuid};

type QuoteKey = (CartUuid, AddressUuid, Option<String>);

/// Recently computed quotes, shared between clones.
///
/// Entries are only a display aid; checkout always prices again inside its transaction.
#[derive(Debug, Clone)]
pub(crate) struct QuoteCache {
    ttl: SignedDuration,
    entries: Arc<Mutex<FxHashMap<QuoteKey, (Timestamp, Quote)>>>,
}

impl QuoteCache {
    #[must_use]
    pub(crate) fn new(ttl: SignedDuration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    pub(crate) async fn get(
        &self,
        cart: CartUuid,
        address: AddressUuid,
        coupon_code: Option<&str>,
        now: Timestamp,
    ) -> Option<Quote> {
        let key = (cart, address, coupon_code.map(str::to_string));
        let mut entries = self.entries.lock().await;

        match entries.get(&key) {
            Some((stored_at, quote)) if now.duration_since(*stored_at) < self.ttl => {
                Some(quote.clone())
            }
            Some(_) => {
                entries.remove(&key);

                None
            }
            None => None,
        }
    }

    pub(crate) async fn put(
        &self,
        cart: CartUuid,
        address: AddressUuid,
        coupon_code: Option<&str>,
        now: Timestamp,
        quote: Quote,
    ) {
        let mut entries = self.entries.lock().await;

        entries.retain(|_, (stored_at, _)| now.duration_since(*stored_at) < self.ttl);
        entries.insert(
            (cart, address, coupon_code.map(str::to_string)),
            (now, quote),
        );
    }
}
