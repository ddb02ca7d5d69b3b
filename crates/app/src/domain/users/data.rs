//! User Data

use souq::{actors::Role, regions::Region};

use crate::domain::users::records::{AddressUuid, UserUuid};

/// New User Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub uuid: UserUuid,
    pub name: String,
    pub role: Role,
    pub region: Option<Region>,
}

/// New Address Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddress {
    pub uuid: AddressUuid,
    pub user_uuid: UserUuid,
    pub region: Region,
    pub line: String,
}
