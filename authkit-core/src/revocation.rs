//! Revocation registry
//!
//! Tracks invalidated token IDs until their natural expiry. This is the only
//! mutable shared state in the auth core: logout, refresh rotation, and
//! pruning all touch it concurrently.
//!
//! Held in memory, so revocations are lost on restart and are not shared
//! across server instances. Acceptable here because token lifetimes are
//! short; a multi-instance deployment needs an externally shared registry.

use crate::TokenId;
use std::collections::HashMap;
use std::sync::RwLock;

/// Mapping from token ID to that token's natural expiry (unix seconds).
///
/// An expired-but-unpruned entry still reports revoked, which is a harmless
/// false positive: the token is already dead. Pruning only bounds growth.
#[derive(Debug, Default)]
pub struct RevocationRegistry {
    entries: RwLock<HashMap<TokenId, u64>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        RevocationRegistry {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Mark a token ID as revoked until `expires_at` passes.
    ///
    /// Revoking an already-revoked ID keeps the later expiry, so a revoke
    /// racing a prune of the same ID cannot lose the entry: a just-inserted
    /// entry's expiry is necessarily in the future.
    pub fn revoke(&self, token_id: TokenId, expires_at: u64) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries
            .entry(token_id)
            .and_modify(|exp| *exp = (*exp).max(expires_at))
            .or_insert(expires_at);
    }

    /// Whether a token ID has been revoked
    pub fn is_revoked(&self, token_id: &TokenId) -> bool {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        entries.contains_key(token_id)
    }

    /// Remove entries whose natural expiry has passed. Returns the number of
    /// entries removed.
    pub fn prune(&self, now: u64) -> usize {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let before = entries.len();
        entries.retain(|_, exp| *exp >= now);
        before - entries.len()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
