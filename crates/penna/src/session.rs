//! Session management: login, registration, logout and boot restoration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::auth::{self, AccessToken, Claims, Credentials, RefreshToken, Registration, TokenPair};
use crate::config::{Config, RestorePolicy};
use crate::error::{AuthError, Error};
use crate::gateway::RequestGateway;
use crate::http::{ApiRequest, LOGIN, LoginRequest, LoginResponse, PROFILE, REGISTER};
use crate::profile::{ProfileUpdate, UserProfile};
use crate::state::{SessionError, SessionSnapshot, SessionState, SessionStatus};
use crate::store::CredentialStore;

/// Message used when the login endpoint gives no reason.
const LOGIN_FAILED: &str = "Login failed";

/// Message used when registration fails without field errors.
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

/// Owns the authoritative session state and drives every transition.
///
/// All network I/O goes through the [`RequestGateway`], which shares this
/// manager's store and state, so a refresh failure on any call ends the
/// session here too.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use penna::{Config, Credentials, MemoryStore, SessionManager, SessionStatus};
///
/// # async fn example() -> Result<(), penna::Error> {
/// let session = SessionManager::new(Config::default(), Arc::new(MemoryStore::new()))?;
/// session.restore().await;
///
/// if session.status() != SessionStatus::Authenticated {
///     session.login(Credentials::new("ana", "Abc12345!")).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    gateway: RequestGateway,
    store: Arc<dyn CredentialStore>,
    state: SessionState,
    restore_policy: RestorePolicy,
    restore_started: AtomicBool,
}

impl SessionManager {
    /// Create a manager in [`SessionStatus::Restoring`].
    ///
    /// Call [`restore`](Self::restore) once at startup to settle it.
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let state = SessionState::new();
        let gateway = RequestGateway::new(&config, store.clone(), state.clone())?;
        Ok(Self {
            inner: Arc::new(ManagerInner {
                gateway,
                store,
                state,
                restore_policy: config.restore_policy,
                restore_started: AtomicBool::new(false),
            }),
        })
    }

    /// The gateway for feature calls made on behalf of this session.
    pub fn gateway(&self) -> &RequestGateway {
        &self.inner.gateway
    }

    pub fn state(&self) -> &SessionState {
        &self.inner.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.status()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.snapshot().user
    }

    pub fn error(&self) -> Option<SessionError> {
        self.inner.state.snapshot().error
    }

    /// Claims of the stored access token, or `None` when nothing is stored.
    ///
    /// Reads the store each time, so a refresh made since restoration is
    /// reflected.
    pub fn access_claims(&self) -> Result<Option<Claims>> {
        match self.inner.store.load()? {
            Some(pair) => Ok(Some(auth::decode(pair.access.as_str())?)),
            None => Ok(None),
        }
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Restore the session from stored credentials.
    ///
    /// Runs once per manager; later calls return the current status without
    /// doing anything. Never fails: every problem ends in
    /// [`SessionStatus::Unauthenticated`] with the store cleared.
    #[instrument(skip(self), fields(policy = ?self.inner.restore_policy))]
    pub async fn restore(&self) -> SessionStatus {
        if self.inner.restore_started.swap(true, Ordering::SeqCst) {
            return self.status();
        }

        let epoch = self.inner.state.epoch();
        if let Err(e) = self.try_restore(epoch).await {
            debug!(error = %e, "Restoration failed");
            // A refused refresh has already ended the session
            if self.inner.state.status() == SessionStatus::Restoring {
                self.inner.state.teardown_if_current(
                    epoch,
                    self.inner.store.as_ref(),
                    Some(SessionError::from(&e)),
                );
            }
        }
        self.status()
    }

    async fn try_restore(&self, epoch: u64) -> Result<()> {
        let Some(pair) = self.inner.store.load()? else {
            debug!("No stored credentials");
            self.inner.state.finish_restore(epoch, None);
            return Ok(());
        };

        let claims = auth::decode(pair.access.as_str())?;
        if auth::is_expired(&claims, Utc::now().timestamp()) {
            match self.inner.restore_policy {
                RestorePolicy::LocalExpiryOnly => {
                    info!("Stored access token expired");
                    return Err(AuthError::SessionExpired.into());
                }
                RestorePolicy::RefreshOnBoot => {
                    info!("Stored access token expired, refreshing");
                    self.inner.gateway.refresh().await?;
                }
            }
        }

        let user = self.fetch_profile().await?;
        if !self.inner.state.finish_restore(epoch, Some(user)) {
            debug!("Restoration overtaken by another transition");
        }
        Ok(())
    }

    /// Log in and establish a new session.
    ///
    /// The tokens are persisted before the profile is fetched, and the
    /// session only becomes [`SessionStatus::Authenticated`] once the profile
    /// arrives. Logging in while authenticated replaces the session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Authentication`] if the API rejected the credentials,
    ///   with the API's reason or a generic message.
    /// - [`AuthError::Superseded`] if [`logout`](Self::logout) or a newer
    ///   login completed first.
    /// - Any profile fetch error, after which the session is ended.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: Credentials) -> Result<UserProfile> {
        info!("Logging in");
        let epoch = self.inner.state.epoch();

        let request = ApiRequest::post(LOGIN).anonymous().json(&LoginRequest {
            username: credentials.username(),
            password: credentials.password(),
        })?;

        let response: LoginResponse = match self.inner.gateway.call(request).await {
            Ok(response) => response,
            Err(e) => {
                let err = login_rejection(e);
                self.inner.state.record_error(&err);
                return Err(err);
            }
        };

        let pair = TokenPair::new(
            AccessToken::new(response.access),
            RefreshToken::new(response.refresh),
        );
        // Claiming the epoch makes restores and refreshes still in flight for
        // the previous pair stale
        let store = self.inner.store.as_ref();
        let claimed = self
            .inner
            .state
            .claim_unless_torn_down(epoch, || store.save(&pair));
        let epoch = match claimed {
            Some(Ok(claimed)) => claimed,
            Some(Err(e)) => {
                self.inner.state.record_error(&e);
                return Err(e);
            }
            None => return Err(AuthError::Superseded.into()),
        };

        let user = match self.fetch_profile().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Profile fetch after login failed");
                self.inner
                    .state
                    .teardown_if_current(epoch, store, Some(SessionError::from(&e)));
                return Err(e);
            }
        };

        let state = &self.inner.state;
        match state.commit_if_current(epoch, || state.authenticate(user.clone())) {
            Some(()) => Ok(user),
            None => Err(AuthError::Superseded.into()),
        }
    }

    /// Create an account, then log in with it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for field errors, found locally or
    ///   reported by the API, aggregated into one message.
    /// - [`AuthError::Registration`] when the API failed without usable
    ///   field errors.
    /// - Any [`login`](Self::login) error.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<UserProfile> {
        if let Err(e) = registration.validate() {
            let err = Error::from(e);
            self.inner.state.record_error(&err);
            return Err(err);
        }

        info!("Registering account");
        let request = ApiRequest::post(REGISTER).anonymous().json(&registration)?;
        if let Err(e) = self.inner.gateway.call_no_response(request).await {
            let err = registration_rejection(e);
            self.inner.state.record_error(&err);
            return Err(err);
        }

        debug!("Account created, logging in");
        self.login(registration.credentials()).await
    }

    /// End the session. Never fails.
    ///
    /// Any login or refresh still in flight will find the session gone and
    /// discard its result.
    pub fn logout(&self) {
        info!("Logging out");
        self.inner.state.teardown(self.inner.store.as_ref(), None);
    }

    /// Fetch the profile again and update the session's copy.
    pub async fn profile(&self) -> Result<UserProfile> {
        let user = self.fetch_profile().await?;
        self.inner.state.replace_user(user.clone());
        Ok(user)
    }

    /// Update the signed-in user's profile.
    ///
    /// Rejections are returned to the caller and leave the session as is.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let request = ApiRequest::put(PROFILE).json(update)?;
        let user: UserProfile = self.inner.gateway.call(request).await?;
        info!("Profile updated");
        self.inner.state.replace_user(user.clone());
        Ok(user)
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.inner.gateway.call(ApiRequest::get(PROFILE)).await
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.inner.state)
            .field("gateway", &self.inner.gateway)
            .field("restore_policy", &self.inner.restore_policy)
            .finish()
    }
}

/// Map a failed login call to the error shown on the login form.
fn login_rejection(err: Error) -> Error {
    match err {
        Error::Protocol(p) => AuthError::Authentication {
            message: p
                .detail
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| LOGIN_FAILED.to_string()),
        }
        .into(),
        other => other,
    }
}

/// Map a failed registration call to a validation or generic error.
fn registration_rejection(err: Error) -> Error {
    let body = match err {
        Error::Protocol(p) => p.body,
        _ => None,
    };

    match body {
        Some(Value::Object(map)) if !map.is_empty() => {
            let fields = map
                .into_iter()
                .map(|(field, value)| {
                    let messages = match value {
                        Value::Array(items) => items.into_iter().map(value_text).collect(),
                        other => vec![value_text(other)],
                    };
                    (field, messages)
                })
                .collect();
            AuthError::Validation {
                message: auth::aggregate_field_errors(&fields),
                fields,
            }
            .into()
        }
        Some(Value::String(text)) if !text.trim().is_empty() => AuthError::Validation {
            message: format!("Registration failed: {}", text),
            fields: Default::default(),
        }
        .into(),
        _ => AuthError::Registration {
            message: REGISTRATION_FAILED.to_string(),
        }
        .into(),
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProtocolError, TransportError};
    use serde_json::json;

    fn protocol(status: u16, body: Value) -> Error {
        ProtocolError::from_body(status, &body.to_string()).into()
    }

    #[test]
    fn login_rejection_uses_api_detail() {
        let err = login_rejection(protocol(
            401,
            json!({"detail": "No active account found with the given credentials"}),
        ));
        assert!(matches!(err, Error::Auth(AuthError::Authentication { .. })));
        assert_eq!(
            err.to_string(),
            "No active account found with the given credentials"
        );
    }

    #[test]
    fn login_rejection_falls_back_to_generic_message() {
        let err = login_rejection(protocol(400, json!({"password": ["This field is required."]})));
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[test]
    fn login_transport_errors_pass_through() {
        let err = login_rejection(TransportError::Timeout.into());
        assert!(matches!(err, Error::Transport(TransportError::Timeout)));
    }

    #[test]
    fn registration_rejection_aggregates_fields() {
        let err = registration_rejection(protocol(
            400,
            json!({
                "username": ["A user with that username already exists."],
                "password": ["This password is too common.", "This password is entirely numeric."]
            }),
        ));
        match err {
            Error::Auth(AuthError::Validation { message, fields }) => {
                assert_eq!(
                    message,
                    "Registration failed: password: This password is too common., \
                     This password is entirely numeric.; \
                     username: A user with that username already exists."
                );
                assert_eq!(fields["password"].len(), 2);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn registration_rejection_accepts_scalar_field_values() {
        let err = registration_rejection(protocol(400, json!({"email": "Enter a valid email address."})));
        assert_eq!(
            err.to_string(),
            "Registration failed: email: Enter a valid email address."
        );
    }

    #[test]
    fn registration_rejection_with_text_body() {
        let err = registration_rejection(protocol(400, json!("Registrations are closed")));
        assert_eq!(err.to_string(), "Registration failed: Registrations are closed");
    }

    #[test]
    fn registration_rejection_without_body_is_generic() {
        let err = registration_rejection(ProtocolError::from_body(500, "<html>").into());
        assert!(matches!(err, Error::Auth(AuthError::Registration { .. })));
        assert_eq!(err.to_string(), REGISTRATION_FAILED);

        let err = registration_rejection(TransportError::Timeout.into());
        assert_eq!(err.to_string(), REGISTRATION_FAILED);
    }
}
