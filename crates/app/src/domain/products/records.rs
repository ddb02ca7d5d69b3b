//! Product Records

use jiff::Timestamp;

use souq::money::Amount;

use crate::{domain::users::records::UserUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Record
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub supplier_uuid: UserUuid,
    pub name: String,
    pub price: Amount,
    pub stock: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
