//! Auth data models.

use jiff::Timestamp;
use uuid::Uuid;

use crate::domain::users::records::UserUuid;

/// API token metadata persisted in storage.
#[derive(Debug, Clone)]
pub struct ApiTokenRecord {
    pub uuid: Uuid,
    pub user_uuid: UserUuid,
    pub created_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// New API token persistence payload.
#[derive(Debug, Clone)]
pub(crate) struct NewApiToken {
    pub uuid: Uuid,
    pub user_uuid: UserUuid,
    pub token_hash: String,
}

/// API token issuance result with the one-time raw token.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub record: ApiTokenRecord,
}
