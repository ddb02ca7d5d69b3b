//! Cart Records

use jiff::Timestamp;

use souq::{money::Amount, regions::Region};

use crate::{
    domain::{products::records::ProductUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
#[derive(Debug, Clone)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub user_uuid: UserUuid,
    pub items: Vec<CartItemRecord>,
    pub created_at: Timestamp,
}

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Cart Item Record
#[derive(Debug, Clone)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
    pub created_at: Timestamp,
}

/// Cart item joined with its product's current price and supplier pickup point.
#[derive(Debug, Clone)]
pub struct CheckoutLineRecord {
    pub item_uuid: CartItemUuid,
    pub product_uuid: ProductUuid,
    pub supplier_uuid: UserUuid,
    pub unit_price: Amount,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,

    /// Unset when the supplier has no address on file.
    pub supplier_region: Option<Region>,
    pub supplier_address: Option<String>,
}
