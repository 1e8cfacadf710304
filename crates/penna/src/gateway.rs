//! The request gateway: every API call goes through here.
//!
//! The gateway attaches the stored access token, and when the API answers
//! 401 it refreshes the token once and resends the request once. Refreshes
//! are single-flight: concurrent requests that all hit 401 wait for one
//! refresh and then resend with its result.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::auth::{AccessToken, RefreshToken, TokenPair};
use crate::config::Config;
use crate::error::{AuthError, Error};
use crate::http::{
    ApiRequest, AuthMode, HttpClient, HttpResponse, REFRESH, RefreshRequest, RefreshResponse,
};
use crate::state::{SessionError, SessionState, SessionStatus};
use crate::store::CredentialStore;
use crate::types::ApiUrl;

/// Wraps outbound API calls with bearer authentication and a single
/// refresh-and-retry on authorization failure.
///
/// Cheap to clone; clones share the same store, state and refresh lock.
#[derive(Clone)]
pub struct RequestGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: HttpClient,
    store: Arc<dyn CredentialStore>,
    state: SessionState,
    refresh_lock: Mutex<()>,
}

impl RequestGateway {
    /// Create a gateway over `store`, reporting forced logouts to `state`.
    pub fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        state: SessionState,
    ) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(GatewayInner {
                client: HttpClient::new(config)?,
                store,
                state,
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    /// The API base URL requests are sent to.
    pub fn api(&self) -> &ApiUrl {
        self.inner.client.api()
    }

    /// Send a request and decode its JSON response.
    ///
    /// # Errors
    ///
    /// - [`AuthError::SessionExpired`] if a refresh was needed and refused;
    ///   the session has been ended.
    /// - [`Error::Protocol`] for any other non-success status, including a
    ///   401 when no refresh was possible or on the resend.
    /// - [`Error::Transport`] for network failures.
    pub async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.execute(request).await?.json()
    }

    /// Send a request and decode its JSON response, if it has one.
    ///
    /// Returns `None` for an empty body, such as a `204 No Content`.
    pub async fn call_optional<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Option<R>> {
        let response = self.execute(request).await?;
        if response.is_empty() {
            return Ok(None);
        }
        response.json().map(Some)
    }

    /// Send a request and discard its response body.
    pub async fn call_no_response(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    /// Mint a new access token with the stored refresh token.
    ///
    /// Shares the single-flight lock with the automatic refresh path. A
    /// refused refresh ends the session.
    pub async fn refresh(&self) -> Result<AccessToken> {
        let _guard = self.inner.refresh_lock.lock().await;
        let (epoch, stored) = self.inner.state.observe(|| self.inner.store.load());
        match stored? {
            Some(pair) => self.refresh_locked(pair, epoch).await,
            None => Err(AuthError::SessionExpired.into()),
        }
    }

    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    async fn execute(&self, request: ApiRequest) -> Result<HttpResponse> {
        let (epoch, token) = match request.auth() {
            AuthMode::Anonymous => (self.inner.state.epoch(), None),
            AuthMode::Bearer => {
                let (epoch, stored) = self.inner.state.observe(|| self.inner.store.load());
                (epoch, stored?.map(|pair| pair.access))
            }
        };

        let response = self.inner.client.send(&request, token.as_ref()).await?;
        if !(response.is_unauthorized() && request.may_refresh()) {
            return response.into_result();
        }

        debug!("Access token rejected");
        let resend = request.retried();
        match self.recover(token.as_ref(), epoch).await? {
            Some(fresh) => self
                .inner
                .client
                .send(&resend, Some(&fresh))
                .await?
                .into_result(),
            None => response.into_result(),
        }
    }

    /// Find a token to resend with after a 401.
    ///
    /// `Ok(None)` means there is no refresh path and the original 401
    /// should be returned.
    async fn recover(&self, sent: Option<&AccessToken>, epoch: u64) -> Result<Option<AccessToken>> {
        let _guard = self.inner.refresh_lock.lock().await;
        let (current_epoch, stored) = self.inner.state.observe(|| self.inner.store.load());

        match stored? {
            Some(pair) if Some(&pair.access) != sent => {
                debug!("Token changed while waiting, resending without refresh");
                Ok(Some(pair.access))
            }
            Some(pair) => self.refresh_locked(pair, current_epoch).await.map(Some),
            None if current_epoch != epoch => {
                debug!("Session ended while waiting");
                Err(AuthError::SessionExpired.into())
            }
            None => {
                if self.inner.state.status() != SessionStatus::Unauthenticated {
                    warn!("No refresh token stored, ending session");
                    self.inner
                        .state
                        .teardown_if_current(epoch, self.inner.store.as_ref(), None);
                }
                Ok(None)
            }
        }
    }

    /// Refresh using `pair`. Must be called with the refresh lock held.
    async fn refresh_locked(&self, pair: TokenPair, epoch: u64) -> Result<AccessToken> {
        info!("Refreshing access token");

        let outcome = self.request_refresh(&pair.refresh).await;
        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Refresh refused, ending session");
                let expired = Error::from(AuthError::SessionExpired);
                self.inner.state.teardown_if_current(
                    epoch,
                    self.inner.store.as_ref(),
                    Some(SessionError::from(&expired)),
                );
                return Err(expired);
            }
        };

        let refreshed = pair.refreshed(
            AccessToken::new(response.access),
            response.refresh.map(RefreshToken::new),
        );

        let store = self.inner.store.as_ref();
        let applied = self.inner.state.commit_if_current(epoch, || -> Result<bool> {
            match store.load()? {
                Some(current) if current.refresh == pair.refresh => {
                    store.save(&refreshed)?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        });

        match applied {
            Some(Ok(true)) => {
                debug!("Access token refreshed");
                Ok(refreshed.access)
            }
            Some(Err(e)) => Err(e),
            Some(Ok(false)) | None => {
                // A login or logout replaced the pair while the refresh was
                // in flight; resend with whatever is stored now
                debug!("Discarding refresh for a replaced session");
                match store.load()? {
                    Some(current) => Ok(current.access),
                    None => Err(AuthError::SessionExpired.into()),
                }
            }
        }
    }

    async fn request_refresh(&self, refresh: &RefreshToken) -> Result<RefreshResponse> {
        let request = ApiRequest::post(REFRESH).anonymous().json(&RefreshRequest {
            refresh: refresh.as_str(),
        })?;
        self.inner
            .client
            .send(&request, None)
            .await?
            .into_result()?
            .json()
    }
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("api", self.inner.client.api())
            .field("store", &self.inner.store)
            .finish()
    }
}
