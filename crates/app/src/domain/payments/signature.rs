//! Webhook signatures
//!
//! The gateway signs the raw request body with HMAC-SHA256 and sends `sha256=<hex digest>` in the
//! [`SIGNATURE_HEADER`] header.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "Souq-Signature";

const SCHEME: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8], payload: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;

    mac.update(payload);

    Some(mac)
}

/// Signature header value for `payload`.
#[must_use]
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    mac(secret, payload)
        .map(|mac| format!("{SCHEME}{}", hex::encode(mac.finalize().into_bytes())))
        .unwrap_or_default()
}

/// Check a signature header against `payload` in constant time.
#[must_use]
pub fn verify(secret: &[u8], payload: &[u8], header: &str) -> bool {
    let Some(digest) = header.trim().strip_prefix(SCHEME) else {
        return false;
    };

    let Ok(expected) = hex::decode(digest) else {
        return false;
    };

    mac(secret, payload).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test";

    #[test]
    fn signed_payload_verifies() {
        let body = br#"{"type":"payment.succeeded"}"#;
        let header = sign(SECRET, body);

        assert!(header.starts_with("sha256="));
        assert!(verify(SECRET, body, &header));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = sign(SECRET, b"amount=100");

        assert!(!verify(SECRET, b"amount=1", &header));
        assert!(!verify(b"other", b"amount=100", &header));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(!verify(SECRET, b"x", ""));
        assert!(!verify(SECRET, b"x", "md5=abcd"));
        assert!(!verify(SECRET, b"x", "sha256=not-hex"));
    }
}
