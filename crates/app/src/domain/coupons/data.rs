//! Coupon Data

use jiff::Timestamp;
use uuid::Uuid;

use souq::{coupons::CouponDiscount, money::Amount};

use crate::domain::users::records::UserUuid;

/// New Coupon Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub uuid: Uuid,
    pub code: String,
    pub supplier_uuid: UserUuid,
    pub discount: CouponDiscount,
    pub min_purchase_amount: Amount,
    pub valid_from: Timestamp,
    pub valid_until: Option<Timestamp>,
    pub max_uses: u32,
    pub max_uses_per_user: u32,
}
