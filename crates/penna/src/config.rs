//! Client configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, InvalidInputError};
use crate::types::ApiUrl;

/// API base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What boot-time restoration does with an access token that has already
/// expired locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// Mint a new access token with the stored refresh token, then fetch the
    /// profile. Falls back to signing out if the refresh is refused.
    #[default]
    RefreshOnBoot,
    /// Sign out immediately without contacting the API.
    LocalExpiryOnly,
}

impl FromStr for RestorePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refresh" | "refresh-on-boot" => Ok(RestorePolicy::RefreshOnBoot),
            "local-expiry" | "local-expiry-only" => Ok(RestorePolicy::LocalExpiryOnly),
            other => Err(InvalidInputError::Other {
                message: format!(
                    "unknown restore policy '{}', expected 'refresh' or 'local-expiry'",
                    other
                ),
            }
            .into()),
        }
    }
}

/// Settings for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: ApiUrl,
    pub timeout: Duration,
    pub user_agent: String,
    pub restore_policy: RestorePolicy,
}

impl Config {
    /// Configuration for the given API with default settings.
    pub fn new(api_url: ApiUrl) -> Self {
        Self {
            api_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("penna/", env!("CARGO_PKG_VERSION")).to_string(),
            restore_policy: RestorePolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_restore_policy(mut self, policy: RestorePolicy) -> Self {
        self.restore_policy = policy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let api_url = DEFAULT_API_URL.parse().expect("default API URL is valid");
        Self::new(api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.api_url.endpoint("users/login/"), "http://localhost:8000/api/users/login/");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.user_agent.starts_with("penna/"));
        assert_eq!(config.restore_policy, RestorePolicy::RefreshOnBoot);
    }

    #[test]
    fn restore_policy_parses_cli_names() {
        assert_eq!("refresh".parse::<RestorePolicy>().unwrap(), RestorePolicy::RefreshOnBoot);
        assert_eq!(
            "local-expiry".parse::<RestorePolicy>().unwrap(),
            RestorePolicy::LocalExpiryOnly
        );
        assert!("sometimes".parse::<RestorePolicy>().is_err());
    }

    #[test]
    fn builders_override() {
        let config = Config::default()
            .with_timeout(Duration::from_secs(2))
            .with_restore_policy(RestorePolicy::LocalExpiryOnly)
            .with_user_agent("test");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.restore_policy, RestorePolicy::LocalExpiryOnly);
        assert_eq!(config.user_agent, "test");
    }
}
