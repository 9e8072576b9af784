//! Shared-secret verification for webhook deliveries.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::ServerError;

pub(crate) static WEBHOOK_SECRET_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-webhook-secret");

/// Compares two secrets without leaking how many leading bytes match.
///
/// Both sides are hashed first, then the digests are folded byte-by-byte, so
/// the comparison cost is independent of the secret contents and lengths.
pub(crate) fn secrets_match(expected: &str, presented: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let presented = Sha256::digest(presented.as_bytes());
    expected
        .iter()
        .zip(presented.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(&WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Strict check: the secret must be configured and must match.
///
/// A missing configuration, a missing header and a wrong value all produce
/// the same rejection.
pub(crate) fn require_secret(
    expected: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), ServerError> {
    let Some(expected) = expected else {
        return Err(ServerError::Authentication);
    };
    match presented_secret(headers) {
        Some(presented) if secrets_match(expected, presented) => Ok(()),
        _ => Err(ServerError::Authentication),
    }
}

/// Lenient check: verified only when a secret is configured.
///
/// The unconfigured case is logged as a warning at startup, not silently
/// treated as secure.
pub(crate) fn check_optional_secret(
    expected: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), ServerError> {
    match expected {
        None => Ok(()),
        Some(_) => require_secret(expected, headers),
    }
}
