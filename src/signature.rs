//! Webhook signature verification.
//!
//! Both inbound webhooks sign the raw request body with HMAC-SHA256 and a
//! shared secret. The payment provider additionally binds a timestamp into the
//! signed payload (`t=<unix>,v1=<hex>`), which is checked against a tolerance
//! window to reject replays.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Maximum age of a signed payment event, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
}

fn hmac_hex(secret: &[u8], parts: &[&[u8]]) -> Result<String, SignatureError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| SignatureError::Malformed)?;
    for part in parts {
        mac.update(part);
    }
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a `t=<unix>,v1=<hex>[,v1=<hex>...]` header over `"{t}.{body}"`.
pub fn verify_timestamped(
    secret: &str,
    header: &str,
    body: &[u8],
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<&str> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for pair in header.split(',') {
        match pair.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if (now - ts).abs() > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let expected = hmac_hex(secret.as_bytes(), &[timestamp.as_bytes(), b".", body])?;
    if candidates
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Verify a plain hex HMAC-SHA256 of the body.
pub fn verify_body(secret: &str, body: &[u8], signature: &str) -> Result<(), SignatureError> {
    let signature = signature.trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature);
    let expected = hmac_hex(secret.as_bytes(), &[body])?;
    if constant_time_compare(&expected, &signature.to_ascii_lowercase()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
