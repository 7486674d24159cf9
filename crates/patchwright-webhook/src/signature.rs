//! Webhook signature verification

use crate::{WebhookError, WebhookResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify the HMAC-SHA256 signature of a raw webhook body
///
/// The header carries `sha256=<hex digest>`. Comparison happens inside the
/// MAC's `verify_slice`, which is constant-time.
///
/// # Errors
/// Returns `WebhookError::InvalidSignature` for missing prefixes, non-hex
/// digests, and mismatches.
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> WebhookResult<()> {
    let hex_digest = signature_header
        .strip_prefix("sha256=")
        .ok_or(WebhookError::InvalidSignature)?;

    let expected = hex::decode(hex_digest).map_err(|_| WebhookError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature)
}

/// Compute the signature header value for a body (used by tests and clients)
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
