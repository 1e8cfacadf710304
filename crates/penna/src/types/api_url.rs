//! Base URL of the blog API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{Error, InvalidInputError};

/// Where the blog API lives, e.g. `https://blog.example.com/api`.
///
/// Bearer tokens are sent to this URL, so plain HTTP is only accepted for a
/// loopback host. The stored form has no trailing slash; endpoint paths are
/// joined with exactly one.
///
/// ```
/// use penna::ApiUrl;
///
/// let api = ApiUrl::new("http://localhost:8000/api/").unwrap();
/// assert_eq!(api.endpoint("users/login/"), "http://localhost:8000/api/users/login/");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiUrl(Url);

impl ApiUrl {
    /// Parse and check a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::ApiUrl`] naming the first rule broken.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let reject = |reason: String| InvalidInputError::ApiUrl {
            value: s.to_string(),
            reason,
        };

        let mut url = Url::parse(s).map_err(|e| reject(e.to_string()))?;
        check(&url).map_err(|reason| reject(reason.to_string()))?;

        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&path);
        Ok(Self(url))
    }

    /// Absolute URL of `path`, which is taken relative to the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.0.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }
}

fn check(url: &Url) -> Result<(), &'static str> {
    if url.cannot_be_a_base() {
        return Err("must be an absolute URL");
    }
    let Some(host) = url.host() else {
        return Err("must have a host");
    };
    match url.scheme() {
        "https" => {}
        "http" if is_loopback(&host) => {}
        _ => return Err("must use HTTPS (HTTP allowed only for localhost)"),
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment");
    }
    Ok(())
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => *name == "localhost",
        Host::Ipv4(addr) => addr.is_loopback(),
        Host::Ipv6(addr) => addr.is_loopback(),
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ApiUrl {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ApiUrl> for String {
    fn from(api: ApiUrl) -> Self {
        api.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_http_only_on_loopback() {
        for ok in [
            "http://localhost:8000/api",
            "http://127.0.0.1:9000",
            "http://[::1]:8000/api",
            "https://blog.example.com/api",
        ] {
            assert!(ApiUrl::new(ok).is_ok(), "{} should be accepted", ok);
        }

        let err = ApiUrl::new("http://blog.example.com/api").unwrap_err();
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn needs_an_absolute_base() {
        assert!(ApiUrl::new("/api").is_err());
        assert!(ApiUrl::new("not a url").is_err());
        assert!(ApiUrl::new("mailto:ana@x.com").is_err());
    }

    #[test]
    fn query_and_fragment_are_refused() {
        assert!(ApiUrl::new("https://blog.example.com/api?x=1").is_err());
        assert!(ApiUrl::new("https://blog.example.com/api#top").is_err());
    }

    #[test]
    fn paths_are_joined_with_one_slash() {
        let with_slash = ApiUrl::new("http://localhost:8000/api/").unwrap();
        let without = ApiUrl::new("http://localhost:8000/api").unwrap();
        assert_eq!(with_slash, without);
        assert_eq!(
            without.endpoint("/users/profile/"),
            "http://localhost:8000/api/users/profile/"
        );

        let root = ApiUrl::new("https://blog.example.com").unwrap();
        assert_eq!(root.endpoint("users/login/"), "https://blog.example.com/users/login/");
    }

    #[test]
    fn config_files_cannot_smuggle_bad_urls() {
        let api: ApiUrl = serde_json::from_str(r#""https://blog.example.com/api""#).unwrap();
        assert_eq!(api.host(), Some("blog.example.com"));
        assert!(serde_json::from_str::<ApiUrl>(r#""http://blog.example.com""#).is_err());
    }
}
