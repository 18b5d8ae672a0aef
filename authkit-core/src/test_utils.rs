//! Test fixtures for exercising the auth stack
//!
//! Behind the `test-utils` feature so downstream crates can build a fully
//! wired issuer/verifier pair with seeded accounts in their own tests.

use crate::{
    codec::TokenCodec, store::MemoryCredentialStore, CredentialStore, RevocationRegistry, Role,
    TokenConfig, TokenIssuer, TokenVerifier,
};
use std::sync::Arc;

/// Password for the seeded `alice` (USER) account
pub const ALICE_PASSWORD: &str = "alice-password";

/// Password for the seeded `root` (ADMIN) account
pub const ROOT_PASSWORD: &str = "root-password";

/// A fully wired auth stack over an in-memory store
pub struct TestAuth {
    pub store: Arc<MemoryCredentialStore>,
    pub revocations: Arc<RevocationRegistry>,
    pub issuer: TokenIssuer,
    pub verifier: TokenVerifier,
}

/// Build an isolated auth stack with two seeded accounts:
/// `alice` (USER) and `root` (ADMIN).
pub fn test_auth(secret: &[u8]) -> TestAuth {
    let store = Arc::new(MemoryCredentialStore::new());
    store
        .create("Alice", "Smith", "alice", ALICE_PASSWORD, Role::User)
        .unwrap()
        .unwrap();
    store
        .create("Root", "Admin", "root", ROOT_PASSWORD, Role::Admin)
        .unwrap()
        .unwrap();

    let codec = TokenCodec::from_secret(secret);
    let revocations = Arc::new(RevocationRegistry::new());
    let issuer = TokenIssuer::new(
        Arc::clone(&store) as Arc<dyn CredentialStore>,
        codec.clone(),
        Arc::clone(&revocations),
        TokenConfig::default(),
    )
    .unwrap();
    let verifier = TokenVerifier::new(codec, Arc::clone(&revocations));

    TestAuth {
        store,
        revocations,
        issuer,
        verifier,
    }
}
