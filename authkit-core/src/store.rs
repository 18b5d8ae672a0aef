//! Credential store interface and password hashing
//!
//! The auth core only ever reads user records. Mutation (registration,
//! password change) belongs to the surrounding user-management code, which
//! for the in-memory store below means its `insert`/`create` methods.

use crate::{AuthError, Result, Role, User, UserId};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Read-only lookup of user records by login.
///
/// Implementations backed by a network store must bound lookup latency with
/// their own timeout and surface failures as `StoreUnavailable`; the core
/// never retries.
pub trait CredentialStore: Send + Sync {
    fn find_by_login(&self, login: &str) -> Result<Option<User>>;
}

/// Hash a plain password with Argon2id into PHC string format
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a plain password against a PHC-format Argon2id hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// In-memory credential store keyed by login.
///
/// Suitable for tests and single-process deployments; a production deployment
/// swaps in a database-backed implementation of [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicU64,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        MemoryCredentialStore {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a user with a freshly hashed password.
    ///
    /// Returns `None` if the login is already taken.
    pub fn create(
        &self,
        first_name: &str,
        last_name: &str,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<Option<User>> {
        let password_hash = hash_password(password)?;

        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::Internal("credential store lock poisoned".to_string()))?;

        if users.contains_key(login) {
            return Ok(None);
        }

        let user = User {
            id: UserId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            login: login.to_string(),
            password_hash,
            role,
        };

        users.insert(login.to_string(), user.clone());
        Ok(Some(user))
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::StoreUnavailable("lock poisoned".to_string()))?;

        Ok(users.get(login).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_verify_rejects_bad_hash_format() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn test_create_and_find() {
        let store = MemoryCredentialStore::new();
        let user = store
            .create("Alice", "Smith", "alice", "secret", Role::User)
            .unwrap()
            .expect("login should be free");

        assert_eq!(user.login, "alice");
        assert!(verify_password("secret", &user.password_hash));

        let found = store.find_by_login("alice").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_by_login("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_login_rejected() {
        let store = MemoryCredentialStore::new();
        store
            .create("Alice", "Smith", "alice", "secret", Role::User)
            .unwrap()
            .unwrap();

        assert!(store
            .create("Other", "Alice", "alice", "secret2", Role::Admin)
            .unwrap()
            .is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemoryCredentialStore::new();
        let a = store
            .create("A", "A", "a", "pw", Role::User)
            .unwrap()
            .unwrap();
        let b = store
            .create("B", "B", "b", "pw", Role::User)
            .unwrap()
            .unwrap();
        assert_ne!(a.id, b.id);
    }
}
