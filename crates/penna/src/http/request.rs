//! Immutable request descriptor.

use std::fmt;

use reqwest::Method;
use serde::Serialize;

use crate::Result;
use crate::error::InvalidInputError;

/// Whether a request carries the stored access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach the stored access token if there is one, and refresh it on 401.
    Bearer,
    /// Never attach a token and never refresh. Used by the token endpoints
    /// themselves, where a 401 means bad credentials.
    Anonymous,
}

/// A request to the blog API, relative to the configured base URL.
///
/// Descriptors are never mutated in flight: the gateway derives a marked
/// copy for the one permitted resend.
///
/// ```
/// use penna::ApiRequest;
///
/// let request = ApiRequest::get("blogs/").query("page", "2");
/// assert_eq!(request.path(), "blogs/");
/// assert!(!request.is_retry());
/// ```
#[derive(Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    auth: AuthMode,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth: AuthMode::Bearer,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Body {
            message: e.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach an already-built JSON body.
    pub fn json_value(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Send without a bearer token and never refresh on 401.
    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }

    /// The copy used for the single resend after a refresh.
    pub(crate) fn retried(&self) -> Self {
        Self {
            retried: true,
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    /// True for the resend that follows a refresh.
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    /// Whether a 401 on this request may trigger a refresh and resend.
    pub fn may_refresh(&self) -> bool {
        self.auth == AuthMode::Bearer && !self.retried
    }
}

// Bodies may carry passwords, so only their presence is shown.
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body.as_ref().map(|_| "[JSON]"))
            .field("auth", &self.auth)
            .field("retried", &self.retried)
            .finish()
    }
}
