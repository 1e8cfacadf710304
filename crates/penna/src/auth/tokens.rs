//! Token types for bearer authentication.

use std::fmt;

/// An access token for authenticated API requests.
///
/// Access tokens are short-lived JWTs sent as bearer credentials.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Only `exp` and the subject may be read from it, see [`crate::auth::decode`]
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers or persisting.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
///
/// Refresh tokens are longer-lived and only ever sent to the refresh endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// The access and refresh tokens of one session, stored as a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

impl TokenPair {
    pub fn new(access: AccessToken, refresh: RefreshToken) -> Self {
        Self { access, refresh }
    }

    /// Returns a pair with a new access token, keeping the refresh token
    /// unless the API rotated it.
    pub fn refreshed(&self, access: AccessToken, rotated: Option<RefreshToken>) -> Self {
        Self {
            access,
            refresh: rotated.unwrap_or_else(|| self.refresh.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_hides_value_in_debug() {
        let token = AccessToken::new("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn pair_debug_hides_both_tokens() {
        let pair = TokenPair::new(AccessToken::new("acc-secret"), RefreshToken::new("ref-secret"));
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("acc-secret"));
        assert!(!debug.contains("ref-secret"));
    }

    #[test]
    fn refreshed_keeps_refresh_token_unless_rotated() {
        let pair = TokenPair::new(AccessToken::new("a1"), RefreshToken::new("r1"));

        let kept = pair.refreshed(AccessToken::new("a2"), None);
        assert_eq!(kept.access.as_str(), "a2");
        assert_eq!(kept.refresh.as_str(), "r1");

        let rotated = pair.refreshed(AccessToken::new("a3"), Some(RefreshToken::new("r2")));
        assert_eq!(rotated.access.as_str(), "a3");
        assert_eq!(rotated.refresh.as_str(), "r2");
    }
}
