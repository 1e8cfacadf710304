//! Token claim decoding and expiry checks.
//!
//! Decoding here is advisory: the signature is not verified, so only `exp`
//! and the subject are ever read. Whether a token is actually accepted is
//! decided by the API on each call.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AuthError;

/// Claims read from a token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Subject identifier (`sub`, or `user_id` as issued by the blog API).
    pub subject: Option<String>,
    /// Issued-at, seconds since the Unix epoch.
    pub issued_at: Option<i64>,
    /// `access` or `refresh`, when the issuer labels its tokens.
    pub token_type: Option<String>,
}

impl Claims {
    /// Seconds until expiry, negative once expired.
    pub fn expires_in(&self, now: i64) -> i64 {
        self.exp - now
    }
}

#[derive(Deserialize)]
struct RawClaims {
    exp: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    iat: Option<Value>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Decode the claims of a JWT without verifying its signature.
///
/// # Errors
///
/// Returns [`AuthError::MalformedToken`] if the token is not three
/// dot-separated segments, the payload is not base64url-encoded JSON, or
/// the `exp` claim is missing or not a number.
pub fn decode(token: &str) -> Result<Claims, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::malformed("expected three dot-separated segments"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::malformed(format!("payload is not base64url: {}", e)))?;

    let raw: RawClaims = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::malformed(format!("payload is not a JSON object: {}", e)))?;

    let exp = raw
        .exp
        .as_ref()
        .and_then(as_seconds)
        .ok_or_else(|| AuthError::malformed("missing numeric exp claim"))?;

    let subject = raw.sub.or(raw.user_id).and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Ok(Claims {
        exp,
        subject,
        issued_at: raw.iat.as_ref().and_then(as_seconds),
        token_type: raw.token_type,
    })
}

/// Returns true when the token is expired at `now` (seconds since epoch).
///
/// The boundary is inclusive: a token expiring exactly at `now` is expired.
pub fn is_expired(claims: &Claims, now: i64) -> bool {
    claims.exp <= now
}

// Some issuers emit fractional timestamps.
fn as_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with(payload: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn decodes_simplejwt_access_token() {
        let token = token_with(json!({
            "token_type": "access",
            "exp": 1_900_000_000,
            "iat": 1_899_999_700,
            "jti": "f1c2",
            "user_id": 7
        }));
        let claims = decode(&token).unwrap();
        assert_eq!(claims.exp, 1_900_000_000);
        assert_eq!(claims.subject.as_deref(), Some("7"));
        assert_eq!(claims.issued_at, Some(1_899_999_700));
        assert_eq!(claims.token_type.as_deref(), Some("access"));
    }

    #[test]
    fn prefers_sub_over_user_id() {
        let token = token_with(json!({"exp": 10, "sub": "ana", "user_id": 7}));
        assert_eq!(decode(&token).unwrap().subject.as_deref(), Some("ana"));
    }

    #[test]
    fn missing_optional_claims_are_fine() {
        let claims = decode(&token_with(json!({"exp": 10}))).unwrap();
        assert_eq!(claims.subject, None);
        assert_eq!(claims.issued_at, None);
    }

    #[test]
    fn tolerates_padded_payload() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(br#"{"exp":5}"#);
        let claims = decode(&format!("{}.{}.sig", header, body)).unwrap();
        assert_eq!(claims.exp, 5);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(decode("abc"), Err(AuthError::MalformedToken { .. })));
        assert!(matches!(decode("a.b"), Err(AuthError::MalformedToken { .. })));
        assert!(matches!(decode("a.b.c.d"), Err(AuthError::MalformedToken { .. })));
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert!(matches!(
            decode("header.!!!.sig"),
            Err(AuthError::MalformedToken { .. })
        ));
    }

    #[test]
    fn rejects_non_json_payload() {
        let body = URL_SAFE_NO_PAD.encode(b"not json");
        let token = format!("h.{}.s", body);
        assert!(matches!(decode(&token), Err(AuthError::MalformedToken { .. })));
    }

    #[test]
    fn rejects_missing_exp() {
        let token = token_with(json!({"sub": "ana"}));
        let err = decode(&token).unwrap_err();
        assert!(err.to_string().contains("exp"));
    }

    #[test]
    fn rejects_string_exp() {
        let token = token_with(json!({"exp": "tomorrow"}));
        assert!(decode(&token).is_err());
    }

    #[test]
    fn expiry_is_inclusive_at_boundary() {
        let now = 1_700_000_000;
        let at = |exp| Claims {
            exp,
            subject: None,
            issued_at: None,
            token_type: None,
        };
        assert!(is_expired(&at(now - 3600), now));
        assert!(is_expired(&at(now), now));
        assert!(!is_expired(&at(now + 1), now));
        assert!(!is_expired(&at(now + 3600), now));
    }

    #[test]
    fn expires_in_counts_down() {
        let claims = decode(&token_with(json!({"exp": 100}))).unwrap();
        assert_eq!(claims.expires_in(40), 60);
        assert_eq!(claims.expires_in(130), -30);
    }
}
