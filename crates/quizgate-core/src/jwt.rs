//! Local JWT expiry reader.
//!
//! The expiry is read as a scheduling hint only. Signatures are not checked
//! and the result is never used to decide whether a request is authorized;
//! the server remains the authority. Tokens may come from untrusted storage,
//! so every decoding step fails soft.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The only claim we care about.
#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: serde_json::Number,
}

/// Returns the absolute expiry encoded in `token`'s `exp` claim.
///
/// Returns `None` for anything that is not a three-segment token whose middle
/// segment is base64url-encoded JSON with a numeric `exp` (seconds since the
/// epoch).
///
/// # Example
///
/// ```
/// use quizgate_core::jwt::expiry_of;
///
/// // {"exp":1700000000}
/// let token = "e30.eyJleHAiOjE3MDAwMDAwMDB9.c2ln";
/// assert_eq!(expiry_of(token).unwrap().timestamp(), 1_700_000_000);
/// assert!(expiry_of("garbage").is_none());
/// ```
pub fn expiry_of(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;

    let seconds = match claim.exp.as_i64() {
        Some(seconds) => seconds,
        None => {
            let seconds = claim.exp.as_f64()?;
            if !seconds.is_finite() {
                return None;
            }
            // Saturating cast; out-of-range values are rejected below.
            seconds.trunc() as i64
        }
    };

    DateTime::from_timestamp(seconds, 0)
}
