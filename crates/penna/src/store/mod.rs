//! Credential storage.
//!
//! A [`CredentialStore`] is a single mutable slot holding the current
//! [`TokenPair`]. It performs no validation; deciding whether the tokens are
//! still good is the session manager's job.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::fmt;

use crate::Result;
use crate::auth::TokenPair;

/// Durable holder for the access and refresh tokens.
///
/// Both tokens are written as one record. Writes are last-write-wins.
pub trait CredentialStore: Send + Sync + fmt::Debug {
    /// Persist a token pair, replacing whatever was stored.
    fn save(&self, pair: &TokenPair) -> Result<()>;

    /// Load the stored pair, if any.
    fn load(&self) -> Result<Option<TokenPair>>;

    /// Remove the stored pair. Succeeds when nothing is stored.
    fn clear(&self) -> Result<()>;
}
