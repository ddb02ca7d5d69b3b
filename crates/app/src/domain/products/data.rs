//! Products Data

use souq::money::Amount;

use crate::domain::{products::records::ProductUuid, users::records::UserUuid};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub supplier_uuid: UserUuid,
    pub name: String,
    pub price: Amount,
    pub stock: u64,
}

/// Product Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub price: Amount,
    pub stock: u64,
}
