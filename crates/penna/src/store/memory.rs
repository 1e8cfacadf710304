//! In-process credential store.

use std::sync::{Mutex, PoisonError};

use crate::Result;
use crate::auth::TokenPair;

use super::CredentialStore;

/// A credential store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<TokenPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a pair.
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            slot: Mutex::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn save(&self, pair: &TokenPair) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<()> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, RefreshToken};

    #[test]
    fn save_load_clear() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let pair = TokenPair::new(AccessToken::new("a"), RefreshToken::new("r"));
        store.save(&pair).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = MemoryStore::new();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
