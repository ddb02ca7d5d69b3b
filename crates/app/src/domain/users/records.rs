//! User Records

use jiff::Timestamp;

use souq::{actors::Role, money::SignedAmount, regions::Region};

use crate::uuids::TypedUuid;

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;

/// User Record
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub uuid: UserUuid,
    pub name: String,
    pub role: Role,

    /// Serviced region for delivery personnel.
    pub region: Option<Region>,

    /// Cached balance; every change is paired with a transaction row.
    pub balance: SignedAmount,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Address UUID
pub type AddressUuid = TypedUuid<AddressRecord>;

/// Address Record
#[derive(Debug, Clone)]
pub struct AddressRecord {
    pub uuid: AddressUuid,
    pub user_uuid: UserUuid,
    pub region: Region,
    pub line: String,
    pub created_at: Timestamp,
}
