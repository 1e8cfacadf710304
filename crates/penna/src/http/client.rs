//! HTTP client implementation.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use crate::Result;
use crate::auth::AccessToken;
use crate::config::Config;
use crate::error::{ProtocolError, TransportError};
use crate::types::ApiUrl;

use super::request::ApiRequest;

/// A response whose body has been read but not interpreted.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// True when there is no body to decode, as with `204 No Content`.
    pub fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.body.trim().is_empty()
    }

    /// Turn a non-success status into a [`ProtocolError`].
    pub fn into_result(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ProtocolError::from_body(self.status.as_u16(), &self.body).into())
        }
    }

    /// Decode a successful JSON body.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_str(&self.body).map_err(|e| {
            TransportError::Decode {
                message: e.to_string(),
            }
            .into()
        })
    }
}

/// HTTP client bound to one API base URL.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: reqwest::Client,
    api: ApiUrl,
}

impl HttpClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api: config.api_url.clone(),
        })
    }

    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// Send a request once, with `token` as the bearer credential if given.
    ///
    /// Non-success statuses are returned as responses, not errors, so the
    /// gateway can inspect them.
    #[instrument(skip(self, request, token), fields(method = %request.method(), path = request.path(), retry = request.is_retry()))]
    pub async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<HttpResponse> {
        let url = self.api.endpoint(request.path());
        debug!(authed = token.is_some(), "API request");

        let mut builder = self.client.request(request.method().clone(), &url);
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!(status = %status, bytes = body.len(), "API response");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let config = Config::default();
        let client = HttpClient::new(&config).unwrap();
        assert_eq!(client.api(), &config.api_url);
    }

    #[test]
    fn empty_bodies() {
        let response = |status, body: &str| HttpResponse {
            status,
            body: body.into(),
        };
        assert!(response(StatusCode::NO_CONTENT, "").is_empty());
        assert!(response(StatusCode::OK, " \n").is_empty());
        assert!(!response(StatusCode::OK, "[]").is_empty());
    }

    #[test]
    fn into_result_maps_failures() {
        let ok = HttpResponse {
            status: StatusCode::OK,
            body: "{}".into(),
        };
        assert!(ok.into_result().is_ok());

        let denied = HttpResponse {
            status: StatusCode::UNAUTHORIZED,
            body: r#"{"detail": "Token is invalid or expired"}"#.into(),
        };
        assert!(denied.is_unauthorized());
        let err = denied.into_result().unwrap_err();
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Token is invalid or expired"));
    }

    #[test]
    fn json_decode_failure_is_transport_error() {
        let response = HttpResponse {
            status: StatusCode::OK,
            body: "not json".into(),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Transport(TransportError::Decode { .. })
        ));
    }
}
