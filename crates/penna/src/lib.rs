//! penna - session and authentication client for the Penna blog API
//!
//! This library keeps a blog front end signed in. A [`SessionManager`] owns
//! the session state, persists tokens through a [`CredentialStore`], and
//! sends every API call through a [`RequestGateway`] that refreshes an
//! expired access token once and resends the request.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use penna::{ApiRequest, Config, Credentials, FileStore, SessionManager};
//!
//! # async fn example() -> Result<(), penna::Error> {
//! let store = Arc::new(FileStore::new("/tmp/penna/credentials.json"));
//! let session = SessionManager::new(Config::default(), store)?;
//! session.restore().await;
//!
//! let user = session.login(Credentials::new("ana", "Abc12345!")).await?;
//! println!("signed in as {}", user.username);
//!
//! let blogs: serde_json::Value = session.gateway().call(ApiRequest::get("blogs/")).await?;
//! println!("{}", blogs);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod profile;
pub mod route;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

// Re-export primary types at crate root for convenience
pub use auth::{AccessToken, Claims, Credentials, RefreshToken, Registration, TokenPair};
pub use config::{Config, RestorePolicy};
pub use error::{
    AuthError, Error, ErrorKind, InvalidInputError, ProtocolError, StorageError, TransportError,
};
pub use gateway::RequestGateway;
pub use http::{ApiRequest, AuthMode, Method};
pub use profile::{ProfileUpdate, UserProfile};
pub use route::{Access, Decision, RouteGate};
pub use session::SessionManager;
pub use state::{SessionError, SessionSnapshot, SessionState, SessionStatus};
pub use store::{CredentialStore, FileStore, MemoryStore};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
