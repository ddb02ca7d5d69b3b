//! API token formatting, parsing and hashing.
//!
//! Tokens look like `sq_<token uuid>_<secret hex>`. Only the SHA-256 digest of the whole token
//! is stored, so a leaked table does not leak usable credentials.

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// API token identifier prefix.
pub const API_TOKEN_PREFIX: &str = "sq";

/// Number of secret bytes encoded in a token.
pub const API_TOKEN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiTokenError {
    #[error("api token format is invalid")]
    InvalidFormat,

    #[error("api token secret encoding is invalid")]
    InvalidSecretEncoding,
}

/// A freshly generated token; the raw text is only ever shown once.
#[derive(Debug, Clone)]
pub struct GeneratedApiToken {
    pub uuid: Uuid,
    pub token: String,
}

#[must_use]
pub fn generate_api_token() -> GeneratedApiToken {
    let mut secret = [0_u8; API_TOKEN_SECRET_BYTES];

    OsRng.fill_bytes(&mut secret);

    let uuid = Uuid::now_v7();

    GeneratedApiToken {
        uuid,
        token: format!("{API_TOKEN_PREFIX}_{}_{}", uuid.simple(), hex::encode(secret)),
    }
}

/// Check a bearer token's shape and return the token UUID it names.
///
/// # Errors
///
/// Returns an error when the prefix, UUID or secret segment is malformed.
pub fn parse_api_token(token: &str) -> Result<Uuid, ApiTokenError> {
    let mut parts = token.splitn(3, '_');

    let (Some(API_TOKEN_PREFIX), Some(uuid), Some(secret)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(ApiTokenError::InvalidFormat);
    };

    let uuid = Uuid::try_parse(uuid).map_err(|_| ApiTokenError::InvalidFormat)?;

    let secret = hex::decode(secret).map_err(|_| ApiTokenError::InvalidSecretEncoding)?;

    if secret.len() != API_TOKEN_SECRET_BYTES {
        return Err(ApiTokenError::InvalidSecretEncoding);
    }

    Ok(uuid)
}

/// Hex SHA-256 digest stored in place of the token.
#[must_use]
pub fn hash_api_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_parse_back_to_their_uuid() {
        let generated = generate_api_token();

        assert!(generated.token.starts_with("sq_"));
        assert_eq!(parse_api_token(&generated.token), Ok(generated.uuid));
    }

    #[test]
    fn parse_rejects_foreign_prefixes_and_short_secrets() {
        let uuid = Uuid::nil().simple();

        assert_eq!(
            parse_api_token(&format!("lt_{uuid}_{}", "ab".repeat(32))),
            Err(ApiTokenError::InvalidFormat)
        );
        assert_eq!(
            parse_api_token(&format!("sq_{uuid}_abcd")),
            Err(ApiTokenError::InvalidSecretEncoding)
        );
        assert_eq!(
            parse_api_token("sq_not-a-uuid"),
            Err(ApiTokenError::InvalidFormat)
        );
    }

    #[test]
    fn hashes_are_stable_and_distinct() {
        let first = generate_api_token();
        let second = generate_api_token();

        assert_eq!(hash_api_token(&first.token), hash_api_token(&first.token));
        assert_ne!(hash_api_token(&first.token), hash_api_token(&second.token));
        assert_eq!(hash_api_token(&first.token).len(), 64);
    }
}
