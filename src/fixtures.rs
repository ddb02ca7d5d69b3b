//! Fixtures

use jiff::{Timestamp, ToSpan};
use uuid::Uuid;

use crate::{
    coupons::{Coupon, CouponDiscount},
    money::Amount,
    regions::{Region, Warehouse, WarehouseDirectory},
};

/// Warehouse with a predictable address.
pub(crate) fn warehouse(region: &str, flat_fee: Amount) -> Warehouse {
    Warehouse {
        region: Region::new(region),
        address: format!("{region} warehouse"),
        flat_fee,
    }
}

/// Cairo (30.00) and Giza (25.00).
pub(crate) fn directory() -> WarehouseDirectory {
    WarehouseDirectory::new([warehouse("Cairo", 3_000), warehouse("Giza", 2_500)])
        .unwrap_or_default()
}

/// Active, unlimited coupon `SAVE` owned by a fresh supplier.
pub(crate) fn coupon(discount: CouponDiscount) -> Coupon {
    let now = Timestamp::now();

    Coupon {
        uuid: Uuid::now_v7(),
        code: "SAVE".to_string(),
        supplier: Uuid::now_v7(),
        discount,
        min_purchase_amount: 0,
        valid_from: now.checked_sub(24.hours()).unwrap_or(now),
        valid_until: None,
        active: true,
        max_uses: 100,
        max_uses_per_user: 1,
        uses_count: 0,
    }
}
