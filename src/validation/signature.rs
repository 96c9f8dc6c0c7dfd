//! HMAC-SHA256 request signature verification.
//!
//! Trusted senders sign `"{timestamp}.{raw_body}"` with the shared ingest
//! secret and send the hex digest alongside the timestamp. Verification is
//! fail-closed and compares decoded digests in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::logging::structured::LogContext;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed distance between sender and receiver clocks.
pub const MAX_SKEW_SECONDS: i64 = 300;

/// Header carrying the Unix timestamp (decimal seconds).
pub const TIMESTAMP_HEADER: &str = "X-SITREP-TIMESTAMP";

/// Header carrying the hex HMAC signature.
pub const SIGNATURE_HEADER: &str = "X-SITREP-SIGNATURE";

/// Reasons a signed request is rejected.
///
/// Callers should map every variant to the same outward response; the
/// variant itself is for logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no ingest secret configured")]
    MissingSecret,
    #[error("timestamp header is not an integer")]
    InvalidTimestamp,
    #[error("timestamp outside the allowed skew window")]
    TimestampSkew,
    #[error("signature does not match payload")]
    BadSignature,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingSecret => "missing_secret",
            AuthError::InvalidTimestamp => "invalid_timestamp",
            AuthError::TimestampSkew => "timestamp_skew",
            AuthError::BadSignature => "bad_signature",
        }
    }
}

/// Compute the hex signature for a payload.
///
/// Must stay byte-identical to the recomputation in [`verify_signature`].
pub fn sign_payload(secret: &str, timestamp: i64, raw_body: &[u8]) -> String {
    hex::encode(signature_bytes(secret, timestamp, raw_body))
}

fn signature_bytes(secret: &str, timestamp: i64, raw_body: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length. An empty digest never verifies.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return Vec::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw_body);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison of two hex strings.
///
/// Undecodable input, empty input and length mismatches are simply
/// "not equal". Only the length check may return early.
pub fn hex_digests_equal(expected: &str, provided: &str) -> bool {
    let (expected, provided) = match (hex::decode(expected), hex::decode(provided.trim())) {
        (Ok(e), Ok(p)) => (e, p),
        _ => return false,
    };
    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }
    expected.ct_eq(provided.as_slice()).into()
}

/// Verify a signed request.
///
/// # Arguments
/// * `secret` - Shared ingest secret (`None` or empty = unconfigured)
/// * `timestamp_header` - Raw timestamp header value
/// * `signature_header` - Raw hex signature header value
/// * `raw_body` - Exact request body bytes as transmitted
/// * `now` - Current Unix time in seconds
pub fn verify_signature(
    secret: Option<&str>,
    timestamp_header: &str,
    signature_header: &str,
    raw_body: &[u8],
    now: i64,
) -> Result<(), AuthError> {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => return Err(AuthError::MissingSecret),
    };

    let timestamp: i64 = timestamp_header
        .trim()
        .parse()
        .map_err(|_| AuthError::InvalidTimestamp)?;

    if now.abs_diff(timestamp) > MAX_SKEW_SECONDS as u64 {
        return Err(AuthError::TimestampSkew);
    }

    let expected = sign_payload(secret, timestamp, raw_body);
    if !hex_digests_equal(&expected, signature_header) {
        return Err(AuthError::BadSignature);
    }

    Ok(())
}

/// [`verify_signature`] with decision logging.
///
/// Logs the specific failure reason and skew, never the secret or body.
pub fn verify_request(
    secret: Option<&str>,
    timestamp_header: &str,
    signature_header: &str,
    raw_body: &[u8],
    now: i64,
    ctx: &LogContext,
) -> Result<(), AuthError> {
    match verify_signature(secret, timestamp_header, signature_header, raw_body, now) {
        Ok(()) => {
            crate::log_debug!(ctx, "SIGNATURE_VERIFY", valid = true, body_len = raw_body.len());
            Ok(())
        }
        Err(e) => {
            crate::log_warn!(
                ctx,
                "SIGNATURE_REJECTED",
                reason = e.code(),
                timestamp = timestamp_header,
                body_len = raw_body.len(),
            );
            Err(e)
        }
    }
}
