//! Compact token decoding
//!
//! Splits a `header.payload[.signature]` token and base64url-decodes the first
//! two segments into JSON objects. Nothing here interprets claims; that is the
//! job of [`crate::claims`].
//!
//! The signature segment is carried through untouched and never checked:
//! tokens reaching the SDK were already validated at the transport boundary.

use std::fmt;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::{Map, Value};

use crate::error::{AuthError, Result};

/// URL-safe alphabet, padding accepted but not required
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Header and payload documents of a compact token
#[derive(Clone, PartialEq)]
pub struct DecodedToken {
    /// Decoded header object
    pub header: Map<String, Value>,
    /// Decoded payload object (with `scp` normalized)
    pub payload: Map<String, Value>,
}

// Claims may hold personal data; keep them out of logs and panics
impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("payload", &"[REDACTED]")
            .finish()
    }
}

/// Decode a compact token into its header and payload documents
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the token has fewer than two
/// segments, a segment is not base64url, or a segment is not a JSON object.
///
/// # Example
///
/// ```rust
/// use ssokit_auth::codec::decode;
///
/// // {"alg":"RS256"} . {"scp":"read write"}
/// let token = "eyJhbGciOiJSUzI1NiJ9.eyJzY3AiOiJyZWFkIHdyaXRlIn0";
/// let decoded = decode(token).unwrap();
/// assert_eq!(decoded.header["alg"], "RS256");
/// assert_eq!(decoded.payload["scp"], serde_json::json!(["read", "write"]));
/// ```
pub fn decode(token: &str) -> Result<DecodedToken> {
    let mut segments = token.trim().split('.');

    let (Some(header), Some(payload)) = (segments.next(), segments.next()) else {
        return Err(AuthError::malformed("expected at least two `.`-separated segments"));
    };

    let header = decode_segment(header, "header")?;
    let mut payload = decode_segment(payload, "payload")?;
    normalize_scope(&mut payload);

    Ok(DecodedToken { header, payload })
}

fn decode_segment(encoded: &str, segment: &str) -> Result<Map<String, Value>> {
    let bytes = URL_SAFE_LENIENT
        .decode(encoded)
        .map_err(|e| AuthError::malformed(format!("{segment} is not base64url: {e}")))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(AuthError::malformed(format!("{segment} is not a JSON object"))),
        Err(e) => Err(AuthError::malformed(format!("{segment} is not JSON: {e}"))),
    }
}

/// Legacy tokens carry `scp` as one space-delimited string
fn normalize_scope(payload: &mut Map<String, Value>) {
    if let Some(Value::String(scope)) = payload.get("scp") {
        let scopes = scope
            .split_whitespace()
            .map(|s| Value::String(s.to_owned()))
            .collect();
        payload.insert("scp".to_owned(), Value::Array(scopes));
    }
}

/// Encode a JSON object as an unpadded base64url segment
pub fn encode_segment(object: &Map<String, Value>) -> String {
    let json = Value::Object(object.clone()).to_string();
    URL_SAFE_LENIENT.encode(json)
}
