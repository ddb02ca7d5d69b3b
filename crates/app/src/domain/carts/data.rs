//! Cart Data

use crate::domain::{carts::records::CartItemUuid, products::records::ProductUuid};

/// New Cart Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}
