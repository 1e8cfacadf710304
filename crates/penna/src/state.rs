//! Observable session state.
//!
//! [`SessionState`] is the one owned state machine shared by the session
//! manager and the request gateway. Views read snapshots or subscribe to
//! transitions; only this crate drives it.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{Error, ErrorKind};
use crate::profile::UserProfile;
use crate::store::CredentialStore;

/// Whether a user is currently authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Unauthenticated,
    /// Boot-time restoration is in progress. Entered once, never re-entered.
    Restoring,
    Authenticated,
}

/// The last error worth showing to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for SessionError {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A point-in-time view of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// Present only while [`SessionStatus::Authenticated`].
    pub user: Option<UserProfile>,
    pub error: Option<SessionError>,
}

impl SessionSnapshot {
    fn restoring() -> Self {
        Self {
            status: SessionStatus::Restoring,
            user: None,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

/// Shared handle to the session state machine.
///
/// Cheap to clone. Every logout, forced logout and committed login bumps the
/// epoch; restores and refreshes started under an older epoch must not write
/// their results. Logins are only cancelled by a teardown.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<StateInner>,
}

struct StateInner {
    // Held while store mutations tied to an epoch check run.
    epoch: Mutex<Epoch>,
    tx: watch::Sender<SessionSnapshot>,
}

#[derive(Debug, Default)]
struct Epoch {
    current: u64,
    // Value of `current` right after the latest teardown.
    torn_down_at: u64,
}

impl SessionState {
    /// Create a state machine in [`SessionStatus::Restoring`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::restoring());
        Self {
            inner: Arc::new(StateInner {
                epoch: Mutex::new(Epoch::default()),
                tx,
            }),
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.tx.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.tx.borrow().status
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.tx.subscribe()
    }

    /// The current epoch.
    pub fn epoch(&self) -> u64 {
        self.lock_epoch().current
    }

    fn lock_epoch(&self) -> std::sync::MutexGuard<'_, Epoch> {
        self.inner.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with no teardown able to interleave, returning the epoch it
    /// ran under alongside its result.
    pub(crate) fn observe<T>(&self, f: impl FnOnce() -> T) -> (u64, T) {
        let guard = self.lock_epoch();
        let out = f();
        (guard.current, out)
    }

    /// Run `f` only if the epoch has not moved since `epoch` was observed.
    ///
    /// Teardowns wait for `f` to finish, so a store write done inside `f`
    /// can never land after a logout cleared the store.
    pub(crate) fn commit_if_current<T>(&self, epoch: u64, f: impl FnOnce() -> T) -> Option<T> {
        let guard = self.lock_epoch();
        if guard.current != epoch {
            return None;
        }
        let out = f();
        drop(guard);
        Some(out)
    }

    /// Run `f` unless a teardown happened since `since` was observed, and
    /// start a new epoch if it succeeds, so restores and refreshes begun
    /// before it can no longer commit or tear down. Returns the new epoch.
    ///
    /// Other claims in between do not block this one; the last claim wins.
    pub(crate) fn claim_unless_torn_down<E>(
        &self,
        since: u64,
        f: impl FnOnce() -> Result<(), E>,
    ) -> Option<Result<u64, E>> {
        let mut guard = self.lock_epoch();
        if guard.torn_down_at > since {
            return None;
        }
        Some(f().map(|()| {
            guard.current += 1;
            guard.current
        }))
    }

    /// Enter [`SessionStatus::Authenticated`] with a freshly fetched profile.
    pub(crate) fn authenticate(&self, user: UserProfile) {
        info!(username = %user.username, "Session authenticated");
        self.inner.tx.send_modify(|s| {
            s.status = SessionStatus::Authenticated;
            s.user = Some(user);
            s.error = None;
        });
    }

    /// Replace the profile of an authenticated session. Ignored otherwise.
    pub(crate) fn replace_user(&self, user: UserProfile) {
        self.inner.tx.send_if_modified(|s| {
            if s.status == SessionStatus::Authenticated {
                s.user = Some(user);
                true
            } else {
                false
            }
        });
    }

    /// Record a non-fatal error without changing the status.
    pub(crate) fn record_error(&self, error: &Error) {
        let error = SessionError::from(error);
        self.inner.tx.send_modify(|s| s.error = Some(error));
    }

    /// Settle boot-time restoration, if it is still pending.
    ///
    /// Returns false when a login or logout overtook the restoration.
    pub(crate) fn finish_restore(&self, epoch: u64, user: Option<UserProfile>) -> bool {
        self.commit_if_current(epoch, || {
            self.inner.tx.send_if_modified(|s| {
                if s.status != SessionStatus::Restoring {
                    return false;
                }
                match user {
                    Some(user) => {
                        info!(username = %user.username, "Session restored");
                        s.status = SessionStatus::Authenticated;
                        s.user = Some(user);
                    }
                    None => {
                        s.status = SessionStatus::Unauthenticated;
                        s.user = None;
                    }
                }
                true
            })
        })
        .unwrap_or(false)
    }

    /// Clear the store and force [`SessionStatus::Unauthenticated`].
    ///
    /// Never fails; a store that cannot be cleared is logged.
    pub(crate) fn teardown(&self, store: &dyn CredentialStore, error: Option<SessionError>) {
        let mut guard = self.lock_epoch();
        self.teardown_locked(&mut guard, store, error);
    }

    /// Like [`teardown`](Self::teardown), but only if no other teardown
    /// happened since `epoch` was observed. Returns whether it ran.
    pub(crate) fn teardown_if_current(
        &self,
        epoch: u64,
        store: &dyn CredentialStore,
        error: Option<SessionError>,
    ) -> bool {
        let mut guard = self.lock_epoch();
        if guard.current != epoch {
            return false;
        }
        self.teardown_locked(&mut guard, store, error);
        true
    }

    fn teardown_locked(
        &self,
        epoch: &mut Epoch,
        store: &dyn CredentialStore,
        error: Option<SessionError>,
    ) {
        if let Err(e) = store.clear() {
            warn!(error = %e, "Failed to clear credential store");
        }
        epoch.current += 1;
        epoch.torn_down_at = epoch.current;
        info!(epoch = epoch.current, reason = ?error.as_ref().map(|e| e.kind), "Session ended");
        self.inner.tx.send_modify(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.user = None;
            s.error = error;
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("status", &self.status())
            .field("epoch", &self.epoch())
            .finish()
    }
}
